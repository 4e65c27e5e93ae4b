//! Recognition and canonicalization of the YAML 1.2 core and type-repository
//! tags (`!!str`, `tag:yaml.org,2002:str`, ...).

/// The built-in tag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YamlTag {
    Map,
    Omap,
    Pairs,
    Set,
    Seq,
    Binary,
    Bool,
    Float,
    Int,
    Merge,
    Null,
    Str,
    Timestamp,
    Value,
    Yaml,
}

const YAML_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Recognize a built-in tag in either `!!foo` or `tag:yaml.org,2002:foo`
/// form, with or without a `!<...>` wrapper.
pub fn to_tag(tag: &str) -> Option<YamlTag> {
    let mut tag = if tag.starts_with("!<") { &tag[1..] } else { tag };
    if let Some(rest) = tag.strip_prefix("!!") {
        tag = rest;
    } else if tag.starts_with('!') {
        return None;
    } else if let Some(rest) = tag.strip_prefix(YAML_TAG_PREFIX) {
        tag = rest;
    } else if let Some(rest) = tag.strip_prefix('<') {
        let rest = rest.strip_prefix(YAML_TAG_PREFIX)?;
        tag = rest.strip_suffix('>')?;
    }

    match tag {
        "map" => Some(YamlTag::Map),
        "omap" => Some(YamlTag::Omap),
        "pairs" => Some(YamlTag::Pairs),
        "set" => Some(YamlTag::Set),
        "seq" => Some(YamlTag::Seq),
        "binary" => Some(YamlTag::Binary),
        "bool" => Some(YamlTag::Bool),
        "float" => Some(YamlTag::Float),
        "int" => Some(YamlTag::Int),
        "merge" => Some(YamlTag::Merge),
        "null" => Some(YamlTag::Null),
        "str" => Some(YamlTag::Str),
        "timestamp" => Some(YamlTag::Timestamp),
        "value" => Some(YamlTag::Value),
        "yaml" => Some(YamlTag::Yaml),
        _ => None,
    }
}

/// The canonical `!!foo` spelling of a built-in tag.
pub fn from_tag(tag: YamlTag) -> &'static str {
    match tag {
        YamlTag::Map => "!!map",
        YamlTag::Omap => "!!omap",
        YamlTag::Pairs => "!!pairs",
        YamlTag::Set => "!!set",
        YamlTag::Seq => "!!seq",
        YamlTag::Binary => "!!binary",
        YamlTag::Bool => "!!bool",
        YamlTag::Float => "!!float",
        YamlTag::Int => "!!int",
        YamlTag::Merge => "!!merge",
        YamlTag::Null => "!!null",
        YamlTag::Str => "!!str",
        YamlTag::Timestamp => "!!timestamp",
        YamlTag::Value => "!!value",
        YamlTag::Yaml => "!!yaml",
    }
}

/// Canonicalize a tag: built-in tags become their `!!foo` spelling, a
/// verbatim `!<...>` / `<!...>` wrapper is stripped, anything else passes
/// through unchanged.
pub fn normalize_tag(tag: &str) -> &str {
    if let Some(t) = to_tag(tag) {
        return from_tag(t);
    }
    let tag = if tag.starts_with("!<") { &tag[1..] } else { tag };
    if tag.starts_with("<!") {
        if let Some(pos) = tag.find('>') {
            return &tag[1..pos];
        }
    }
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_forms() {
        assert_eq!(to_tag("!!str"), Some(YamlTag::Str));
        assert_eq!(to_tag("tag:yaml.org,2002:int"), Some(YamlTag::Int));
        assert_eq!(to_tag("!<tag:yaml.org,2002:seq>"), Some(YamlTag::Seq));
        assert_eq!(to_tag("!custom"), None);
        assert_eq!(to_tag("!!nosuch"), None);
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_tag("tag:yaml.org,2002:merge"), "!!merge");
        assert_eq!(normalize_tag("!!bool"), "!!bool");
        assert_eq!(normalize_tag("!mine"), "!mine");
        assert_eq!(normalize_tag("<!mine>"), "!mine");
    }
}
