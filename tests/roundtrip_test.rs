//! Round-trip tests between Markdown and HTML.

use docshift::{convert, parse, Block, Document, Format};

const SAMPLE: &str = "\
# Release notes

Intro with **bold**, *italic* and `code`.

## Changes

- first change
- second change
- third change

1. step one
2. step two

```rust
fn main() {
    println!(\"hi\");
}
```

### Links

See [the docs](https://example.com/docs \"Docs\").
";

fn roundtrip(markdown: &str) -> String {
    let html = convert(markdown.as_bytes(), Format::Markdown, Format::Html).unwrap();
    let back = convert(&html, Format::Html, Format::Markdown).unwrap();
    String::from_utf8(back).unwrap()
}

fn outline(doc: &Document) -> Vec<String> {
    doc.blocks
        .iter()
        .map(|block| match block {
            Block::Heading(h) => format!("h{}:{}", h.level, h.plain_text()),
            Block::List(list) => format!(
                "{}:{}",
                if list.ordered { "ol" } else { "ul" },
                list.items
                    .iter()
                    .map(|item| item.plain_text())
                    .collect::<Vec<_>>()
                    .join("|")
            ),
            Block::CodeBlock(code) => format!("code:{:?}:{}", code.language, code.code),
            other => format!("p:{}", other.plain_text()),
        })
        .collect()
}

#[test]
fn test_markdown_html_markdown_preserves_structure() {
    let original = parse(SAMPLE.as_bytes(), Format::Markdown).unwrap();
    let back = roundtrip(SAMPLE);
    let reparsed = parse(back.as_bytes(), Format::Markdown).unwrap();

    assert_eq!(outline(&reparsed), outline(&original));
    assert_eq!(original.stats(), reparsed.stats());
}

#[test]
fn test_roundtrip_is_stable_after_first_pass() {
    let once = roundtrip(SAMPLE);
    let twice = roundtrip(&once);
    assert_eq!(once, twice);
}

#[test]
fn test_code_content_survives_exactly() {
    let markdown = "```\nlet a = 1 < 2 && b;\n    indented\n\n<tag> * _ `\n```\n";
    let back = roundtrip(markdown);
    let doc = parse(back.as_bytes(), Format::Markdown).unwrap();
    match &doc.blocks[..] {
        [Block::CodeBlock(code)] => {
            assert_eq!(code.code, "let a = 1 < 2 && b;\n    indented\n\n<tag> * _ `");
        }
        other => panic!("expected one code block, got {:?}", other),
    }
}

#[test]
fn test_html_heading_and_list_to_markdown() {
    let html = b"<h2>Shopping</h2>\n<ul>\n  <li>Apples</li>\n  <li>Pears</li>\n</ul>";
    let markdown = convert(html, Format::Html, Format::Markdown).unwrap();
    let markdown = String::from_utf8(markdown).unwrap();

    assert!(markdown.starts_with("## Shopping"));
    assert_eq!(markdown, "## Shopping\n\n- Apples\n- Pears\n");

    let doc = parse(markdown.as_bytes(), Format::Markdown).unwrap();
    match &doc.blocks[..] {
        [Block::Heading(h), Block::List(list)] => {
            assert_eq!(h.level, 2);
            assert!(!list.ordered);
            assert_eq!(list.items.len(), 2);
        }
        other => panic!("unexpected blocks {:?}", other),
    }
}

#[test]
fn test_markdown_special_characters_survive() {
    let markdown = "Use 2 \\* 3 and \\_x\\_ and a \\[bracket\\].\n";
    let back = roundtrip(markdown);
    let original = parse(markdown.as_bytes(), Format::Markdown).unwrap();
    let reparsed = parse(back.as_bytes(), Format::Markdown).unwrap();
    assert_eq!(original.plain_text(), reparsed.plain_text());
    assert_eq!(reparsed.plain_text().trim(), "Use 2 * 3 and _x_ and a [bracket].");
}

#[test]
fn test_adjacent_lists_stay_separate() {
    let html = b"<ul><li>a</li></ul><ul><li>b</li></ul>";
    let markdown = convert(html, Format::Html, Format::Markdown).unwrap();
    let doc = parse(&markdown, Format::Markdown).unwrap();
    assert_eq!(doc.blocks.iter().filter(|b| b.is_list()).count(), 2);
}
