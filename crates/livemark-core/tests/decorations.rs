use livemark_core::{
    Decoration, DecorationBuilder, DecorationError, DecorationSetBuilder, DecorationSpec, Document,
    EditorSelection, HeadingReveal, LivePreview, LivePreviewConfig, NodeKind, SyntaxTree,
    SyntaxTreeBuilder, Widget, WidgetSide,
};
use pretty_assertions::assert_eq;

fn tree(len: usize, build: impl FnOnce(&mut SyntaxTreeBuilder)) -> SyntaxTree {
    let mut builder = SyntaxTreeBuilder::new(len);
    build(&mut builder);
    builder.finish()
}

fn heading_tree(text: &str) -> SyntaxTree {
    tree(text.len(), |b| {
        b.enter(NodeKind::Heading(1), 0, text.len());
        b.leaf(NodeKind::HeaderMark, 0, 1);
        b.exit();
    })
}

fn link_tree(text: &str) -> SyntaxTree {
    tree(text.len(), |b| {
        b.enter(NodeKind::Paragraph, 0, text.len());
        b.enter(NodeKind::Link, 0, 16);
        b.leaf(NodeKind::LinkMark, 0, 1);
        b.leaf(NodeKind::LinkMark, 5, 6);
        b.leaf(NodeKind::LinkMark, 6, 7);
        b.leaf(NodeKind::Url, 7, 15);
        b.leaf(NodeKind::LinkMark, 15, 16);
        b.exit();
        b.exit();
    })
}

/// A document exercising every construct, with its tree built from text positions.
fn composite() -> (Document, SyntaxTree) {
    let text = "# Title\n\
                Some *em* and **strong** text with `code`.\n\
                - item\n  - nested\n\
                > quote\n\
                [link](http://x) <http://y> http://z\n\
                ---\n\
                ```rust\nlet x;\n```";
    let at = |needle: &str| text.find(needle).unwrap();

    let tree = tree(text.len(), |b| {
        b.enter(NodeKind::Heading(1), 0, 7);
        b.leaf(NodeKind::HeaderMark, 0, 1);
        b.exit();

        let p = at("Some");
        b.enter(NodeKind::Paragraph, p, at(".\n") + 1);
        let em = at("*em*");
        b.enter(NodeKind::Emphasis, em, em + 4);
        b.leaf(NodeKind::EmphasisMark, em, em + 1);
        b.leaf(NodeKind::EmphasisMark, em + 3, em + 4);
        b.exit();
        let strong = at("**strong**");
        b.enter(NodeKind::StrongEmphasis, strong, strong + 10);
        b.leaf(NodeKind::EmphasisMark, strong, strong + 2);
        b.leaf(NodeKind::EmphasisMark, strong + 8, strong + 10);
        b.exit();
        let code = at("`code`");
        b.enter(NodeKind::InlineCode, code, code + 6);
        b.leaf(NodeKind::CodeMark, code, code + 1);
        b.leaf(NodeKind::CodeMark, code + 5, code + 6);
        b.exit();
        b.exit();

        let item = at("- item");
        let nested = at("- nested");
        let list_end = nested + "- nested".len();
        b.enter(NodeKind::BulletList, item, list_end);
        b.enter(NodeKind::ListItem, item, list_end);
        b.leaf(NodeKind::ListMark, item, item + 1);
        b.leaf(NodeKind::Paragraph, item + 2, item + 6);
        b.enter(NodeKind::BulletList, nested, list_end);
        b.enter(NodeKind::ListItem, nested, list_end);
        b.leaf(NodeKind::ListMark, nested, nested + 1);
        b.leaf(NodeKind::Paragraph, nested + 2, list_end);
        b.exit();
        b.exit();
        b.exit();
        b.exit();

        let quote = at("> quote");
        b.enter(NodeKind::Blockquote, quote, quote + 7);
        b.leaf(NodeKind::QuoteMark, quote, quote + 1);
        b.leaf(NodeKind::Paragraph, quote + 2, quote + 7);
        b.exit();

        let link = at("[link]");
        b.enter(NodeKind::Paragraph, link, at(" http://z") + 9);
        b.enter(NodeKind::Link, link, link + 16);
        b.leaf(NodeKind::LinkMark, link, link + 1);
        b.leaf(NodeKind::LinkMark, link + 5, link + 6);
        b.leaf(NodeKind::LinkMark, link + 6, link + 7);
        b.leaf(NodeKind::Url, link + 7, link + 15);
        b.leaf(NodeKind::LinkMark, link + 15, link + 16);
        b.exit();
        let auto = at("<http://y>");
        b.enter(NodeKind::Autolink, auto, auto + 10);
        b.leaf(NodeKind::LinkMark, auto, auto + 1);
        b.leaf(NodeKind::Url, auto + 1, auto + 9);
        b.leaf(NodeKind::LinkMark, auto + 9, auto + 10);
        b.exit();
        let bare = at("http://z");
        b.leaf(NodeKind::Url, bare, bare + 8);
        b.exit();

        let rule = at("---");
        b.leaf(NodeKind::HorizontalRule, rule, rule + 3);

        let fence = at("```rust");
        b.enter(NodeKind::FencedCode, fence, text.len());
        b.leaf(NodeKind::CodeMark, fence, fence + 3);
        b.leaf(NodeKind::CodeInfo, fence + 3, fence + 7);
        b.leaf(NodeKind::CodeText, fence + 8, fence + 15);
        b.leaf(NodeKind::CodeMark, fence + 15, fence + 18);
        b.exit();
    });
    (Document::new(text), tree)
}

fn spans(decorations: &[Decoration]) -> Vec<(usize, usize)> {
    decorations.iter().map(|d| (d.from, d.to)).collect()
}

#[test]
fn test_heading_marker_revealed_at_line_start() {
    let text = "# Title";
    let doc = Document::new(text);
    let set = DecorationBuilder::default().build(&doc, &heading_tree(text), 0);

    assert_eq!(spans(set.as_slice()), vec![(0, 2), (2, 7)]);
    let marker = &set.as_slice()[0];
    assert!(marker.has_class("formatting-mark"));
    assert!(marker.has_class("heading-1"));
    let content = &set.as_slice()[1];
    assert_eq!(content.class(), Some("heading-1"));
}

#[test]
fn test_heading_marker_hidden_inside_content() {
    let text = "# Title";
    let doc = Document::new(text);
    let set = DecorationBuilder::default().build(&doc, &heading_tree(text), 5);

    assert_eq!(spans(set.as_slice()), vec![(0, 2), (2, 7)]);
    assert_eq!(set.as_slice()[0].spec, DecorationSpec::Hide);
    assert_eq!(set.as_slice()[1].class(), Some("heading-1"));
}

#[test]
fn test_heading_line_reveal_policy() {
    let text = "# Title";
    let doc = Document::new(text);
    let config = LivePreviewConfig::default().with_heading_reveal(HeadingReveal::Line);
    let set = DecorationBuilder::new(config).build(&doc, &heading_tree(text), 5);
    assert!(set.as_slice()[0].has_class("formatting-mark"));
}

#[test]
fn test_list_marker_replaced_by_bullet() {
    let text = "- item";
    let doc = Document::new(text);
    let tree = tree(text.len(), |b| {
        b.enter(NodeKind::BulletList, 0, 6);
        b.enter(NodeKind::ListItem, 0, 6);
        b.leaf(NodeKind::ListMark, 0, 1);
        b.leaf(NodeKind::Paragraph, 2, 6);
    });
    let set = DecorationBuilder::default().build(&doc, &tree, 10);

    assert_eq!(
        set.as_slice(),
        &[
            Decoration::line(0, "list-line indent-0"),
            Decoration::replace(0, 2, Widget::Bullet),
        ]
    );
}

#[test]
fn test_list_marker_shown_when_cursor_adjacent() {
    let text = "- item";
    let doc = Document::new(text);
    let tree = tree(text.len(), |b| {
        b.enter(NodeKind::BulletList, 0, 6);
        b.enter(NodeKind::ListItem, 0, 6);
        b.leaf(NodeKind::ListMark, 0, 1);
    });
    let set = DecorationBuilder::default().build(&doc, &tree, 1);
    assert_eq!(
        set.as_slice()[1],
        Decoration::mark(0, 1, "formatting-mark")
    );
}

#[test]
fn test_link_hidden_outside_cursor() {
    let text = "[text](http://x)";
    let doc = Document::new(text);
    let set = DecorationBuilder::default().build(&doc, &link_tree(text), 100);

    assert_eq!(
        set.as_slice(),
        &[
            Decoration::hide(0, 1),
            Decoration::link(1, 5, "link", "http://x"),
            Decoration::hide(5, 16),
            Decoration::widget(5, Widget::link_icon("http://x"), WidgetSide::After),
        ]
    );
    assert_eq!(set.as_slice()[1].attribute("data-url"), Some("http://x"));
}

#[test]
fn test_link_revealed_inside_cursor() {
    let text = "[text](http://x)";
    let doc = Document::new(text);
    let set = DecorationBuilder::default().build(&doc, &link_tree(text), 3);

    assert!(set.iter().all(|d| !d.is_replace() && d.widget_ref().is_none()));
    assert!(set.as_slice()[0].has_class("formatting-mark"));
    assert_eq!(set.link_url_at(3), Some("http://x"));
}

#[test]
fn test_link_without_url_is_left_raw() {
    let text = "[text]";
    let doc = Document::new(text);
    let tree = tree(text.len(), |b| {
        b.enter(NodeKind::Link, 0, 6);
        b.leaf(NodeKind::LinkMark, 0, 1);
        b.leaf(NodeKind::LinkMark, 5, 6);
    });
    assert!(DecorationBuilder::default().build(&doc, &tree, 100).is_empty());
}

#[test]
fn test_nested_list_indent_depth() {
    let text = "- a\n  - b\n    - c";
    let doc = Document::new(text);
    let tree = tree(text.len(), |b| {
        b.enter(NodeKind::BulletList, 0, 17);
        b.enter(NodeKind::ListItem, 0, 17);
        b.leaf(NodeKind::ListMark, 0, 1);
        b.enter(NodeKind::BulletList, 6, 17);
        b.enter(NodeKind::ListItem, 6, 17);
        b.leaf(NodeKind::ListMark, 6, 7);
        b.enter(NodeKind::BulletList, 14, 17);
        b.enter(NodeKind::ListItem, 14, 17);
        b.leaf(NodeKind::ListMark, 14, 15);
    });
    let set = DecorationBuilder::default().build(&doc, &tree, 100);

    let lines: Vec<_> = set
        .iter()
        .filter(|d| matches!(d.spec, DecorationSpec::Line { .. }))
        .map(|d| (d.from, d.class().unwrap_or_default().to_string()))
        .collect();
    assert_eq!(
        lines,
        vec![
            (0, "list-line indent-0".to_string()),
            (4, "list-line indent-1".to_string()),
            (10, "list-line indent-2".to_string()),
        ]
    );
}

#[test]
fn test_ordered_list_marker_stays_visible() {
    let text = "1. one";
    let doc = Document::new(text);
    let tree = tree(text.len(), |b| {
        b.enter(NodeKind::OrderedList, 0, 6);
        b.enter(NodeKind::ListItem, 0, 6);
        b.leaf(NodeKind::ListMark, 0, 2);
    });
    let set = DecorationBuilder::default().build(&doc, &tree, 100);
    assert_eq!(
        set.as_slice(),
        &[
            Decoration::line(0, "list-line indent-0"),
            Decoration::mark(0, 2, "ordered-list-mark"),
        ]
    );
}

#[test]
fn test_blockquote_marker_only_on_cursor_line() {
    let text = "> a\n> b";
    let doc = Document::new(text);
    let tree = tree(text.len(), |b| {
        b.enter(NodeKind::Blockquote, 0, 7);
        b.leaf(NodeKind::QuoteMark, 0, 1);
        b.leaf(NodeKind::QuoteMark, 4, 5);
    });
    let set = DecorationBuilder::default().build(&doc, &tree, 2);

    assert_eq!(
        set.as_slice(),
        &[
            Decoration::line(0, "blockquote-line"),
            Decoration::mark(0, 2, "formatting-mark"),
            Decoration::mark(2, 3, "quote-text"),
            Decoration::line(4, "blockquote-line"),
            Decoration::hide(4, 6),
            Decoration::mark(6, 7, "quote-text"),
        ]
    );
}

#[test]
fn test_fenced_code_hides_fences_but_keeps_language() {
    let text = "```rust\nlet x;\n```\n\npara";
    let doc = Document::new(text);
    let tree = tree(text.len(), |b| {
        b.enter(NodeKind::FencedCode, 0, 18);
        b.leaf(NodeKind::CodeMark, 0, 3);
        b.leaf(NodeKind::CodeInfo, 3, 7);
        b.leaf(NodeKind::CodeText, 8, 15);
        b.leaf(NodeKind::CodeMark, 15, 18);
        b.exit();
        b.leaf(NodeKind::Paragraph, 20, 24);
    });
    let builder = DecorationBuilder::default();

    let outside = builder.build(&doc, &tree, 22);
    assert_eq!(
        outside.as_slice(),
        &[
            Decoration::line(0, "code-block-line code-fence-line"),
            Decoration::hide(0, 3),
            Decoration::mark(3, 7, "code-language"),
            Decoration::line(8, "code-block-line"),
            Decoration::line(15, "code-block-line code-fence-line"),
            Decoration::hide(15, 18),
        ]
    );

    let inside = builder.build(&doc, &tree, 10);
    assert_eq!(inside.as_slice()[1], Decoration::mark(0, 3, "formatting-mark"));
    assert_eq!(inside.as_slice()[5], Decoration::mark(15, 18, "formatting-mark"));
}

#[test]
fn test_horizontal_rule_widget_off_cursor_line() {
    let text = "a\n\n---";
    let doc = Document::new(text);
    let tree = tree(text.len(), |b| {
        b.leaf(NodeKind::Paragraph, 0, 1);
        b.leaf(NodeKind::HorizontalRule, 3, 6);
    });
    let builder = DecorationBuilder::default();

    let away = builder.build(&doc, &tree, 0);
    assert_eq!(
        away.as_slice(),
        &[Decoration::replace(3, 6, Widget::HorizontalRule)]
    );
    assert!(away.as_slice()[0].widget_ref().is_some_and(Widget::is_block));

    let on_line = builder.build(&doc, &tree, 4);
    assert_eq!(on_line.as_slice(), &[Decoration::mark(3, 6, "formatting-mark")]);
}

#[test]
fn test_bare_url_styled_without_toggling() {
    let text = "see http://x";
    let doc = Document::new(text);
    let tree = tree(text.len(), |b| {
        b.enter(NodeKind::Paragraph, 0, 12);
        b.leaf(NodeKind::Url, 4, 12);
    });
    let builder = DecorationBuilder::default();
    let expected = vec![Decoration::link(4, 12, "link", "http://x")];
    assert_eq!(builder.build(&doc, &tree, 0).as_slice(), expected.as_slice());
    assert_eq!(builder.build(&doc, &tree, 6).as_slice(), expected.as_slice());
}

/// Markers toggle between hidden and formatting-mark; everything else stays put.
#[test]
fn test_hide_show_symmetry() {
    let (doc, tree) = composite();
    let text = doc.text();
    let builder = DecorationBuilder::default();
    let cases = [
        ("*em*", "emphasis"),
        ("**strong**", "strong"),
        ("`code`", "inline-code"),
        ("<http://y>", "link"),
    ];

    for (needle, class) in cases {
        let from = text.find(needle).unwrap();
        let to = from + needle.len();
        let outside = builder.build(&doc, &tree, 0);
        let inside = builder.build(&doc, &tree, from + 2);

        let local = |set: &livemark_core::DecorationSet| -> Vec<Decoration> {
            set.between(from, to)
                .filter(|d| d.from >= from && d.to <= to && d.to > d.from)
                .cloned()
                .collect()
        };
        let (outside, inside) = (local(&outside), local(&inside));
        assert_eq!(outside.len(), inside.len(), "{needle}");

        for (hidden, shown) in outside.iter().zip(&inside) {
            assert_eq!((hidden.from, hidden.to), (shown.from, shown.to), "{needle}");
            if hidden.has_class(class) {
                assert_eq!(hidden, shown, "{needle}: content must not change");
            } else {
                assert_eq!(hidden.spec, DecorationSpec::Hide, "{needle}");
                assert!(shown.has_class("formatting-mark"), "{needle}");
            }
        }
    }
}

#[test]
fn test_sorted_and_conflict_free_at_every_cursor() {
    let (doc, tree) = composite();
    let builder = DecorationBuilder::default();

    for cursor in 0..=doc.len() {
        let set = builder.build(&doc, &tree, cursor);
        assert!(!set.is_empty());
        for pair in set.as_slice().windows(2) {
            assert!(
                pair[0].sort_key() <= pair[1].sort_key(),
                "cursor {cursor}: {:?} before {:?}",
                pair[0],
                pair[1]
            );
        }
        assert_eq!(set.find_conflict(), None, "cursor {cursor}");
        assert!(set.iter().all(|d| d.to <= doc.len()));
    }
}

#[test]
fn test_rebuild_is_idempotent() {
    let (doc, tree) = composite();
    let builder = DecorationBuilder::default();
    for cursor in [0, 9, 40, 70, doc.len()] {
        assert_eq!(
            builder.build(&doc, &tree, cursor),
            builder.build(&doc, &tree, cursor)
        );
    }
}

#[test]
fn test_out_of_order_insert_is_rejected() {
    let mut builder = DecorationSetBuilder::new();
    builder.add(Decoration::mark(5, 8, "a")).unwrap();

    let err = builder.add(Decoration::mark(2, 3, "b")).unwrap_err();
    assert!(matches!(err, DecorationError::OutOfOrder { from: 2, prev_from: 5, .. }));

    // Same offset: a line decoration must precede marks.
    let err = builder.add(Decoration::line(5, "c")).unwrap_err();
    assert!(matches!(err, DecorationError::OutOfOrder { .. }));
    assert_eq!(builder.len(), 1);
}

#[test]
fn test_duplicate_nodes_produce_one_decoration_each() {
    let text = "*a*";
    let doc = Document::new(text);
    let tree = tree(text.len(), |b| {
        b.leaf(NodeKind::Emphasis, 0, 3);
        b.leaf(NodeKind::Emphasis, 0, 3);
    });
    let set = DecorationBuilder::default().build(&doc, &tree, 100);
    assert_eq!(spans(set.as_slice()), vec![(0, 1), (1, 2), (2, 3)]);
}

#[test]
fn test_preview_uses_primary_selection_head() {
    let text = "# Title";
    let doc = Document::new(text);
    let tree = heading_tree(text);
    let preview = LivePreview::default();

    // Anchor on the marker, head inside the content: the marker is hidden.
    let selection = EditorSelection::single(0, 5);
    let set = preview.decorations(&doc, &tree, &selection, None);
    assert_eq!(set.as_slice()[0].spec, DecorationSpec::Hide);
}
