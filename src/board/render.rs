//! HTML fragments for the notice and guest-post lists.

use chrono::{Local, TimeZone};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::model::{GuestPost, Notice, ANONYMOUS_AUTHOR};

pub const EMPTY_NOTICES: &str = r#"<div class="empty-notice">No notices yet.</div>"#;
pub const EMPTY_GUEST_POSTS: &str =
    r#"<div class="empty-posts">Be the first to leave a message!</div>"#;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;

/// Relative for the last 24 hours, then a local calendar date.
/// A zero timestamp renders as nothing.
pub fn format_date(timestamp: i64, now: i64) -> String {
    if timestamp == 0 {
        return String::new();
    }
    let diff = now - timestamp;
    if diff < MINUTE_MS {
        return "just now".to_string();
    }
    if diff < HOUR_MS {
        return format!("{} min ago", diff / MINUTE_MS);
    }
    if diff < DAY_MS {
        return format!("{} h ago", diff / HOUR_MS);
    }
    match Local.timestamp_millis_opt(timestamp).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

fn id_attr(id: Option<impl ToString>) -> String {
    id.map(|i| encode_double_quoted_attribute(&i.to_string()).into_owned())
        .unwrap_or_default()
}

pub fn render_notices(notices: &[Notice], admin: bool, now: i64) -> String {
    if notices.is_empty() {
        return EMPTY_NOTICES.to_string();
    }
    let mut out = String::new();
    for n in notices {
        let id = id_attr(n.id.as_ref());
        out.push_str(&format!(r#"<div class="notice-item" data-id="{id}">"#));
        out.push_str(r#"<div class="notice-header">"#);
        out.push_str(&format!(
            r#"<h4 class="notice-title">{}</h4>"#,
            encode_text(&n.title)
        ));
        out.push_str(&format!(
            r#"<div class="notice-meta"><span class="notice-date">{}</span>"#,
            format_date(n.timestamp, now)
        ));
        if admin {
            out.push_str(&format!(
                concat!(
                    r#"<div class="admin-actions">"#,
                    r#"<button class="admin-action-btn edit-notice-btn" data-id="{id}" title="Edit">edit</button>"#,
                    r#"<button class="admin-action-btn delete-notice-btn" data-id="{id}" title="Delete">delete</button>"#,
                    "</div>"
                ),
                id = id
            ));
        }
        out.push_str("</div></div>");
        out.push_str(&format!(
            r#"<div class="notice-content">{}</div>"#,
            encode_text(&n.content)
        ));
        if n.is_admin {
            out.push_str(r#"<span class="notice-badge">Admin</span>"#);
        }
        out.push_str("</div>");
    }
    out
}

pub fn render_guest_posts(posts: &[GuestPost], admin: bool, now: i64) -> String {
    if posts.is_empty() {
        return EMPTY_GUEST_POSTS.to_string();
    }
    let mut out = String::new();
    for p in posts {
        let id = id_attr(p.id.as_ref());
        let author = if p.author.trim().is_empty() {
            ANONYMOUS_AUTHOR
        } else {
            p.author.as_str()
        };
        out.push_str(&format!(r#"<div class="guest-post-item" data-id="{id}">"#));
        out.push_str(&format!(
            r#"<div class="post-header"><span class="post-author">{}</span>"#,
            encode_text(author)
        ));
        out.push_str(&format!(
            r#"<div class="post-meta"><span class="post-date">{}</span>"#,
            format_date(p.timestamp, now)
        ));
        if admin {
            out.push_str(&format!(
                r#"<button class="admin-action-btn delete-post-btn" data-id="{id}" title="Delete">delete</button>"#
            ));
        }
        out.push_str("</div></div>");
        out.push_str(&format!(
            r#"<div class="post-content">{}</div>"#,
            encode_text(&p.content)
        ));
        out.push_str("</div>");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordId;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn relative_dates() {
        assert_eq!(format_date(0, NOW), "");
        assert_eq!(format_date(NOW - 59_999, NOW), "just now");
        assert_eq!(format_date(NOW + 5_000, NOW), "just now");
        assert_eq!(format_date(NOW - 5 * MINUTE_MS, NOW), "5 min ago");
        assert_eq!(format_date(NOW - 3 * HOUR_MS - 1, NOW), "3 h ago");
        let old = NOW - 3 * DAY_MS;
        let expected = Local
            .timestamp_millis_opt(old)
            .single()
            .unwrap()
            .format("%Y-%m-%d")
            .to_string();
        assert_eq!(format_date(old, NOW), expected);
    }

    #[test]
    fn visitor_text_is_escaped() {
        let posts = vec![GuestPost {
            id: Some(RecordId::Key("-Nx\"1".into())),
            author: "<b>eve</b>".into(),
            content: "<script>alert(1)</script>".into(),
            timestamp: NOW,
        }];
        let html = render_guest_posts(&posts, true, NOW);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&lt;b&gt;eve&lt;/b&gt;"));
        assert!(html.contains(r#"data-id="-Nx&quot;1""#));
        assert!(html.contains("delete-post-btn"));
    }

    #[test]
    fn empty_lists_and_admin_markup() {
        assert_eq!(render_notices(&[], true, NOW), EMPTY_NOTICES);
        assert_eq!(render_guest_posts(&[], false, NOW), EMPTY_GUEST_POSTS);

        let notices = vec![Notice {
            id: Some(RecordId::Num(7)),
            title: "T".into(),
            content: "C".into(),
            timestamp: NOW,
            is_admin: true,
        }];
        let visitor = render_notices(&notices, false, NOW);
        assert!(visitor.contains("notice-badge"));
        assert!(!visitor.contains("edit-notice-btn"));
        let admin = render_notices(&notices, true, NOW);
        assert!(admin.contains(r#"edit-notice-btn" data-id="7""#));
        assert!(admin.contains("delete-notice-btn"));
    }

    #[test]
    fn blank_author_renders_placeholder() {
        let posts = vec![GuestPost {
            id: None,
            author: "  ".into(),
            content: "hi".into(),
            timestamp: NOW,
        }];
        assert!(render_guest_posts(&posts, false, NOW).contains(ANONYMOUS_AUTHOR));
    }
}
