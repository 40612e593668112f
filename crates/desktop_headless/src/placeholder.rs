use futures::stream::{self, StreamExt};
use platform_host::{bounded_history, ContentStream, ContentStreamService, InteractionRecord};

#[derive(Debug, Clone, Copy, Default)]
/// Offline content generator that renders the interaction trail as simple markup.
///
/// The newest interaction becomes the heading and each older one a line below it, streamed as
/// separate fragments so progressive rendering is visible.
pub struct PlaceholderContentService;

impl ContentStreamService for PlaceholderContentService {
    fn stream_content(
        &self,
        history: &[InteractionRecord],
        max_history_length: usize,
    ) -> ContentStream {
        let history = bounded_history(history, max_history_length);
        let Some(latest) = history.first() else {
            return stream::once(async { Err("no interaction to render".to_string()) })
                .boxed_local();
        };

        let mut fragments = vec![format!(
            r#"<div class="p-4"><h2>{}</h2>"#,
            escape_html(label(latest))
        )];
        fragments.extend(
            history[1..]
                .iter()
                .map(|record| format!("<p>after {}</p>", escape_html(label(record)))),
        );
        fragments.push("</div>".to_string());
        stream::iter(fragments.into_iter().map(Ok)).boxed_local()
    }
}

fn label(record: &InteractionRecord) -> &str {
    if record.display_text.trim().is_empty() {
        &record.id
    } else {
        &record.display_text
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn renders_newest_interaction_first_within_the_bound() {
        let history = vec![
            InteractionRecord::click("save", "Save <now>"),
            InteractionRecord::click("type", "Type"),
            InteractionRecord::app_open("notepad", "Notepad"),
        ];
        let fragments: Vec<_> =
            block_on(PlaceholderContentService.stream_content(&history, 2).collect());
        assert_eq!(
            fragments,
            vec![
                Ok(r#"<div class="p-4"><h2>Save &lt;now&gt;</h2>"#.to_string()),
                Ok("<p>after Type</p>".to_string()),
                Ok("</div>".to_string()),
            ]
        );
    }

    #[test]
    fn empty_history_fails_the_stream() {
        let items: Vec<_> = block_on(PlaceholderContentService.stream_content(&[], 3).collect());
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }
}
