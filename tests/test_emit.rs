use yamltree::{
    emit_json, emit_yaml, EmitType, Emitter, NodeId, NodeType, SliceWriter, StringWriter, Tree,
    TreeError,
};

fn keyval(tree: &mut Tree, parent: NodeId, key: &str, val: &str) -> NodeId {
    let node = tree.append_child(parent);
    tree.to_keyval(node, key, val);
    node
}

fn val_root(text: &str) -> Tree {
    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_val(root, text);
    tree.add_flags(root, NodeType::DOC);
    tree
}

#[test_log::test]
fn literal_block_chomping() {
    // one trailing newline: clip
    let tree = val_root("line1\nline2\n");
    assert_eq!(emit_yaml(&tree).unwrap(), "|\n  line1\n  line2\n");

    // two trailing newlines: keep
    let tree = val_root("line1\nline2\n\n");
    assert_eq!(emit_yaml(&tree).unwrap(), "|+\n  line1\n  line2\n\n");

    // no trailing newline: strip
    let tree = val_root("line1\nline2");
    assert_eq!(emit_yaml(&tree).unwrap(), "|-\n  line1\n  line2\n");
}

#[test_log::test]
fn literal_block_under_a_key_indents_one_level() {
    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    keyval(&mut tree, root, "text", "line1\nline2\n");
    assert_eq!(emit_yaml(&tree).unwrap(), "text: |\n  line1\n  line2\n");
}

#[test_log::test]
fn scalar_with_leading_whitespace_is_quoted_not_blocked() {
    // a leading blank disqualifies the literal-block form
    let tree = val_root(" padded\nline");
    assert_eq!(emit_yaml(&tree).unwrap(), "' padded\n\nline'\n");
}

#[test_log::test]
fn quoting_rules() {
    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    keyval(&mut tree, root, "colon", "a: b");
    keyval(&mut tree, root, "squote", "it's");
    keyval(&mut tree, root, "dquote", "he said \"hi\"");
    keyval(&mut tree, root, "both", "it's \"hi\"");
    keyval(&mut tree, root, "num", "42");
    keyval(&mut tree, root, "neg", "-42");
    let quoted = keyval(&mut tree, root, "forced", "42");
    tree.add_flags(quoted, NodeType::VALQUO);

    let out = emit_yaml(&tree).unwrap();
    assert_eq!(
        out,
        concat!(
            "colon: 'a: b'\n",
            "squote: \"it's\"\n",
            "dquote: 'he said \"hi\"'\n",
            "both: 'it''s \"hi\"'\n",
            "num: 42\n",
            "neg: -42\n",
            "forced: '42'\n",
        )
    );
}

#[test_log::test]
fn empty_scalars_distinguish_null_from_empty() {
    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    keyval(&mut tree, root, "empty", "");
    assert_eq!(emit_yaml(&tree).unwrap(), "empty: ''\n");

    // a padding node created by path lookup has no scalar at all
    let mut tree = Tree::new();
    tree.lookup_path_or_modify("x", "seq[1]", None).unwrap();
    assert_eq!(emit_yaml(&tree).unwrap(), "seq:\n  - ~\n  - x\n");
}

#[test_log::test]
fn containers_and_nesting() {
    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    let seq = tree.append_child(root);
    tree.to_keyseq(seq, "seq");
    for v in ["a", "b"] {
        let item = tree.append_child(seq);
        tree.to_val(item, v);
    }
    let inner = tree.append_child(seq);
    tree.to_map(inner);
    keyval(&mut tree, inner, "k", "v");
    let empty_map = tree.append_child(root);
    tree.to_keymap(empty_map, "nothing");

    assert_eq!(
        emit_yaml(&tree).unwrap(),
        "seq:\n  - a\n  - b\n  - k: v\nnothing: {}\n"
    );
}

#[test_log::test]
fn tags_and_anchors_are_emitted() {
    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    let a = keyval(&mut tree, root, "a", "1");
    tree.set_val_anchor(a, "A");
    let b = keyval(&mut tree, root, "b", "*A");
    tree.set_val_ref(b, "A");
    let m = tree.append_child(root);
    tree.to_keymap(m, "typed");
    tree.set_val_tag(m, "!!map");
    keyval(&mut tree, m, "x", "1");

    assert_eq!(
        emit_yaml(&tree).unwrap(),
        "a: &A 1\nb: *A\ntyped: !!map\n  x: 1\n"
    );
}

#[test_log::test]
fn stream_emits_doc_markers() {
    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    keyval(&mut tree, root, "k", "v");
    tree.set_root_as_stream();
    assert_eq!(emit_yaml(&tree).unwrap(), "---\nk: v\n");

    let mut tree = Tree::new();
    tree.to_val(tree.root_id(), "solo");
    tree.set_root_as_stream();
    assert_eq!(emit_yaml(&tree).unwrap(), "--- solo\n");
}

#[test_log::test]
fn json_flow_output() {
    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    keyval(&mut tree, root, "a", "1");
    keyval(&mut tree, root, "flag", "true");
    keyval(&mut tree, root, "name", "x");
    let seq = tree.append_child(root);
    tree.to_keyseq(seq, "items");
    for v in ["7", "y"] {
        let item = tree.append_child(seq);
        tree.to_val(item, v);
    }

    assert_eq!(
        emit_json(&tree).unwrap(),
        "{\"a\": 1,\"flag\": true,\"name\": \"x\",\"items\": [7,\"y\"]}"
    );
}

#[test_log::test]
fn json_keys_are_always_strings_and_quotes_escaped() {
    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    keyval(&mut tree, root, "42", "say \"hi\"");
    assert_eq!(emit_json(&tree).unwrap(), "{\"42\": \"say \\\"hi\\\"\"}");
}

#[test_log::test]
fn json_rejects_streams_tags_and_anchors() {
    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    keyval(&mut tree, root, "k", "v");
    tree.set_root_as_stream();
    assert_eq!(
        emit_json(&tree).unwrap_err(),
        TreeError::JsonFeatureUnsupported("streams")
    );

    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    let k = keyval(&mut tree, root, "k", "v");
    tree.set_val_tag(k, "!!str");
    assert_eq!(
        emit_json(&tree).unwrap_err(),
        TreeError::JsonFeatureUnsupported("tags")
    );

    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    let k = keyval(&mut tree, root, "k", "v");
    tree.set_val_anchor(k, "A");
    assert_eq!(
        emit_json(&tree).unwrap_err(),
        TreeError::JsonFeatureUnsupported("anchors")
    );

    // plain trees pass
    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    keyval(&mut tree, root, "k", "v");
    assert!(emit_json(&tree).is_ok());
}

#[test_log::test]
fn emit_into_bounded_buffer() {
    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    keyval(&mut tree, root, "key", "value");

    let mut big = [0u8; 64];
    let mut emitter = Emitter::new(SliceWriter::new(&mut big));
    let written = emitter
        .emit(EmitType::Yaml, &tree, tree.root_id(), true)
        .unwrap()
        .to_string();
    assert_eq!(written, "key: value\n");

    let mut tiny = [0u8; 4];
    let mut emitter = Emitter::new(SliceWriter::new(&mut tiny));
    let err = emitter
        .emit(EmitType::Yaml, &tree, tree.root_id(), true)
        .unwrap_err();
    assert_eq!(err, TreeError::EmitBufferTooSmall { needed: 11 });

    // truncation-is-ok mode returns the written prefix instead
    let mut tiny = [0u8; 4];
    let mut emitter = Emitter::new(SliceWriter::new(&mut tiny));
    let written = emitter
        .emit(EmitType::Yaml, &tree, tree.root_id(), false)
        .unwrap()
        .to_string();
    assert_eq!(written, "key");
}

#[test_log::test]
fn emitting_a_subtree_starts_unindented() {
    let mut tree = Tree::new();
    let root = tree.root_id();
    tree.to_map(root);
    let m = tree.append_child(root);
    tree.to_keymap(m, "outer");
    keyval(&mut tree, m, "inner", "1");

    let mut emitter = Emitter::new(StringWriter::new());
    let out = emitter.emit(EmitType::Yaml, &tree, m, true).unwrap();
    assert_eq!(out, "outer:\n  inner: 1\n");
}
