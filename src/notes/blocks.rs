//! Rich text and paragraph blocks.
//!
//! Notes are stored as one rich-text property. Moving them into the page
//! body turns every blank line (`\n\n`) inside a text item into a paragraph
//! break, while annotated spans, mentions and equations stay inline.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Separator between paragraphs inside a text item.
const PARAGRAPH_BREAK: &str = "\n\n";

/// Why a notes property cannot be written back as blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteError {
    #[error("Unsupported mention type: {0}")]
    UnsupportedMention(&'static str),
    #[error("Unrecognized mention type")]
    UnrecognizedMention,
}

/// Content of a text item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Value>,
}

/// An equation item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    pub expression: String,
}

/// Target of a mention item. Payloads are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mention {
    Database { database: Value },
    Date { date: Value },
    Page { page: Value },
    User { user: Value },
    LinkPreview { link_preview: Value },
    TemplateMention { template_mention: Value },
    #[serde(other)]
    Unrecognized,
}

/// One rich-text item, as read from a property and written into a block.
///
/// Read-only fields of the API response (`plain_text`, `href`) are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichText {
    Text {
        text: TextContent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Value>,
    },
    Mention {
        mention: Mention,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Value>,
    },
    Equation {
        equation: Equation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Value>,
    },
}

impl RichText {
    /// Check that the item can be sent back to the API.
    fn writable(&self) -> Result<(), NoteError> {
        match self {
            RichText::Mention { mention, .. } => match mention {
                Mention::LinkPreview { .. } => Err(NoteError::UnsupportedMention("link_preview")),
                Mention::TemplateMention { .. } => {
                    Err(NoteError::UnsupportedMention("template_mention"))
                }
                Mention::Unrecognized => Err(NoteError::UnrecognizedMention),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

/// A paragraph block to append to a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "type", rename = "paragraph")]
pub struct ParagraphBlock {
    pub paragraph: Paragraph,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Paragraph {
    pub rich_text: Vec<RichText>,
}

impl ParagraphBlock {
    fn with(item: RichText) -> Self {
        Self {
            paragraph: Paragraph {
                rich_text: vec![item],
            },
        }
    }
}

#[cfg(test)]
impl RichText {
    /// Plain text item without annotations.
    pub fn plain(content: &str) -> Self {
        RichText::Text {
            text: TextContent {
                content: content.to_string(),
                link: None,
            },
            annotations: None,
        }
    }
}

/// Split rich text into paragraph blocks.
///
/// A text item containing blank lines is cut at each one. The first piece
/// continues the current paragraph and every later piece starts a new one.
/// Other items are appended to the current paragraph. No input, no blocks.
pub fn split_paragraphs(items: Vec<RichText>) -> Result<Vec<ParagraphBlock>, NoteError> {
    items.into_iter().try_fold(Vec::new(), |mut blocks, item| {
        item.writable()?;
        push_item(&mut blocks, item);
        Ok(blocks)
    })
}

fn push_item(blocks: &mut Vec<ParagraphBlock>, item: RichText) {
    match item {
        RichText::Text {
            text: TextContent { content, link },
            annotations,
        } => {
            let piece = |content: &str| RichText::Text {
                text: TextContent {
                    content: content.to_string(),
                    link: link.clone(),
                },
                annotations: annotations.clone(),
            };

            let mut pieces = content.split(PARAGRAPH_BREAK);
            // `split` always yields at least one piece.
            let first = pieces.next().unwrap_or_default();
            current(blocks).paragraph.rich_text.push(piece(first));
            blocks.extend(pieces.map(|rest| ParagraphBlock::with(piece(rest))));
        }
        other => current(blocks).paragraph.rich_text.push(other),
    }
}

/// The paragraph being filled, opened on demand.
fn current(blocks: &mut Vec<ParagraphBlock>) -> &mut ParagraphBlock {
    if blocks.is_empty() {
        blocks.push(ParagraphBlock::default());
    }
    let last = blocks.len() - 1;
    &mut blocks[last]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_mention() -> RichText {
        RichText::Mention {
            mention: Mention::Page {
                page: json!({ "id": "page-1" }),
            },
            annotations: None,
        }
    }

    fn contents(block: &ParagraphBlock) -> Vec<String> {
        block
            .paragraph
            .rich_text
            .iter()
            .map(|item| match item {
                RichText::Text { text, .. } => text.content.clone(),
                RichText::Mention { .. } => "@".to_string(),
                RichText::Equation { equation, .. } => format!("${}$", equation.expression),
            })
            .collect()
    }

    #[test]
    fn test_empty_notes_give_no_blocks() {
        assert_eq!(split_paragraphs(vec![]).unwrap(), vec![]);
    }

    #[test]
    fn test_text_without_breaks_is_one_paragraph() {
        let blocks = split_paragraphs(vec![RichText::plain("two pointers")]).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(contents(&blocks[0]), vec!["two pointers"]);
    }

    #[test]
    fn test_multiple_breaks_split_into_paragraphs() {
        let blocks = split_paragraphs(vec![RichText::plain("a\n\nb\n\nc")]).unwrap();

        let paragraphs: Vec<_> = blocks.iter().map(contents).collect();
        assert_eq!(paragraphs, vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn test_first_piece_joins_previous_paragraph() {
        let blocks = split_paragraphs(vec![
            RichText::plain("x"),
            RichText::plain("y\n\nz"),
            RichText::plain("w"),
        ])
        .unwrap();

        let paragraphs: Vec<_> = blocks.iter().map(contents).collect();
        assert_eq!(paragraphs, vec![vec!["x", "y"], vec!["z", "w"]]);
    }

    #[test]
    fn test_single_newline_stays_inline() {
        let blocks = split_paragraphs(vec![RichText::plain("line 1\nline 2")]).unwrap();
        assert_eq!(contents(&blocks[0]), vec!["line 1\nline 2"]);
    }

    #[test]
    fn test_non_text_items_pass_through() {
        let equation = RichText::Equation {
            equation: Equation {
                expression: "O(n)".to_string(),
            },
            annotations: None,
        };
        let blocks = split_paragraphs(vec![
            page_mention(),
            RichText::plain("see above\n\nruntime"),
            equation,
        ])
        .unwrap();

        let paragraphs: Vec<_> = blocks.iter().map(contents).collect();
        assert_eq!(
            paragraphs,
            vec![vec!["@", "see above"], vec!["runtime", "$O(n)$"]]
        );
    }

    #[test]
    fn test_split_pieces_keep_annotations_and_link() {
        let bold = json!({ "bold": true });
        let link = json!({ "url": "https://leetcode.com" });
        let item = RichText::Text {
            text: TextContent {
                content: "a\n\nb".to_string(),
                link: Some(link.clone()),
            },
            annotations: Some(bold.clone()),
        };

        let blocks = split_paragraphs(vec![item]).unwrap();
        for block in &blocks {
            let RichText::Text { text, annotations } = &block.paragraph.rich_text[0] else {
                panic!("expected text");
            };
            assert_eq!(annotations.as_ref(), Some(&bold));
            assert_eq!(text.link.as_ref(), Some(&link));
        }
    }

    #[test]
    fn test_unsupported_mentions_are_rejected() {
        let preview = RichText::Mention {
            mention: Mention::LinkPreview {
                link_preview: json!({ "url": "https://example.com" }),
            },
            annotations: None,
        };
        assert_eq!(
            split_paragraphs(vec![RichText::plain("a"), preview]),
            Err(NoteError::UnsupportedMention("link_preview"))
        );

        let unknown = RichText::Mention {
            mention: Mention::Unrecognized,
            annotations: None,
        };
        assert_eq!(
            split_paragraphs(vec![unknown]),
            Err(NoteError::UnrecognizedMention)
        );
    }

    #[test]
    fn test_rich_text_from_api_response() {
        let items: Vec<RichText> = serde_json::from_value(json!([
            {
                "type": "text",
                "text": { "content": "Use a heap", "link": null },
                "annotations": { "bold": false },
                "plain_text": "Use a heap",
                "href": null
            },
            {
                "type": "mention",
                "mention": { "type": "page", "page": { "id": "p-1" } },
                "plain_text": "Two Sum",
                "href": "https://www.notion.so/p1"
            },
            {
                "type": "mention",
                "mention": { "type": "custom_emoji", "custom_emoji": {} },
                "plain_text": ":x:"
            }
        ]))
        .unwrap();

        assert_eq!(
            items[0],
            RichText::Text {
                text: TextContent {
                    content: "Use a heap".to_string(),
                    link: None,
                },
                annotations: Some(json!({ "bold": false })),
            }
        );
        assert_eq!(items[1], page_mention_with_id("p-1"));
        assert!(matches!(
            items[2],
            RichText::Mention {
                mention: Mention::Unrecognized,
                ..
            }
        ));
    }

    fn page_mention_with_id(id: &str) -> RichText {
        RichText::Mention {
            mention: Mention::Page {
                page: json!({ "id": id }),
            },
            annotations: None,
        }
    }

    #[test]
    fn test_paragraph_block_request_shape() {
        let blocks = split_paragraphs(vec![RichText::plain("hi"), page_mention()]).unwrap();
        let json = serde_json::to_value(&blocks[0]).unwrap();

        assert_eq!(
            json,
            json!({
                "type": "paragraph",
                "paragraph": {
                    "rich_text": [
                        { "type": "text", "text": { "content": "hi" } },
                        { "type": "mention", "mention": { "type": "page", "page": { "id": "page-1" } } }
                    ]
                }
            })
        );
    }
}
