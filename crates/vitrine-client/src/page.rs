// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Scraper for the server-rendered admin page. Only start tags matter:
//! the hidden anti-forgery input and the `tr.profile-row` rows whose
//! `data-*` attributes carry each profile.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use vitrine_app::{Profile, ProfileId};

use crate::token::CSRF_FIELD;

const PROFILE_ROW_CLASS: &str = "profile-row";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminPage {
    pub csrf_token: Option<String>,
    pub profiles: Vec<Profile>,
}

pub fn parse_admin_page(html: &str) -> AdminPage {
    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));

    let mut tokenizer = Tokenizer::new(PageSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();
    tokenizer.sink.page
}

#[derive(Default)]
struct PageSink {
    page: AdminPage,
}

impl TokenSink for PageSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(tag) = token {
            if tag.kind == TagKind::StartTag {
                self.start_tag(&tag);
            }
        }
        TokenSinkResult::Continue
    }
}

impl PageSink {
    fn start_tag(&mut self, tag: &Tag) {
        match &*tag.name {
            "input" if attr(tag, "name") == Some(CSRF_FIELD) => {
                if self.page.csrf_token.is_none() {
                    self.page.csrf_token = attr(tag, "value").map(str::to_owned);
                }
            }
            "tr" if has_class(tag, PROFILE_ROW_CLASS) => {
                if let Some(profile) = profile_from_row(tag) {
                    self.page.profiles.push(profile);
                }
            }
            _ => {}
        }
    }
}

fn attr<'a>(tag: &'a Tag, name: &str) -> Option<&'a str> {
    tag.attrs
        .iter()
        .find(|attr| &*attr.name.local == name)
        .map(|attr| &*attr.value)
}

fn has_class(tag: &Tag, class: &str) -> bool {
    attr(tag, "class").is_some_and(|classes| classes.split_whitespace().any(|item| item == class))
}

fn profile_from_row(tag: &Tag) -> Option<Profile> {
    let raw_id = attr(tag, "data-id").unwrap_or_default();
    let Ok(id) = raw_id.trim().parse::<i64>() else {
        tracing::warn!(raw_id, "skipping profile row without a numeric id");
        return None;
    };
    let text = |name: &str| attr(tag, name).unwrap_or_default().to_owned();
    // Rows rendered by older templates spell the timestamps `data-*-at`.
    let stamp = |name: &str, legacy: &str| {
        attr(tag, name)
            .or_else(|| attr(tag, legacy))
            .unwrap_or_default()
            .to_owned()
    };
    Some(Profile {
        id: ProfileId::new(id),
        identifiant: text("data-identifiant"),
        name: text("data-name"),
        title: text("data-title"),
        created_at: stamp("data-created", "data-created-at"),
        updated_at: stamp("data-updated", "data-updated-at"),
    })
}

#[cfg(test)]
mod tests {
    use super::parse_admin_page;

    #[test]
    fn scrapes_token_and_profile_rows() {
        let html = r#"
            <!DOCTYPE html>
            <form><input type="hidden" name="csrfmiddlewaretoken" value="tok123"></form>
            <!-- <tr class="profile-row" data-id="99"> -->
            <table>
              <tr class="profile-row selected" data-id="1" data-identifiant="acme"
                  data-name="Ada &amp; Co" data-title='Lead &#39;dev&#39;'>
                <td>acme</td>
              </tr>
              <tr class="skill-row" data-id="5"></tr>
              <TR CLASS=profile-row DATA-ID=2 data-identifiant=globex data-name=Hank></TR>
              <tr class="profile-row" data-id="oops"></tr>
            </table>
        "#;

        let page = parse_admin_page(html);
        assert_eq!(page.csrf_token.as_deref(), Some("tok123"));
        let summary = page
            .profiles
            .iter()
            .map(|profile| (profile.id.get(), profile.identifiant.as_str(), profile.name.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(summary, vec![(1, "acme", "Ada & Co"), (2, "globex", "Hank")]);
        assert_eq!(page.profiles[0].title, "Lead 'dev'");
        assert_eq!(page.profiles[1].title, "");
    }

    #[test]
    fn pages_without_rows_or_token_parse_empty() {
        let page = parse_admin_page("<html><body><p>Nothing < here</p></body></html>");
        assert_eq!(page.csrf_token, None);
        assert!(page.profiles.is_empty());
    }

    #[test]
    fn rows_carry_created_and_updated_timestamps() {
        let html = r#"
            <table id="profileTable">
              <tr class="profile-row" data-id="1" data-identifiant="acme" data-name="Ada"
                  data-title="Lead" data-created="2026-02-19T12:34:56Z"
                  data-updated="2026-03-01T08:00:00Z">
                <td>acme</td>
              </tr>
              <tr class="profile-row" data-id="2" data-identifiant="globex"
                  data-created-at="2025-11-02T09:15:00Z" data-updated-at="2025-11-03T10:00:00Z">
              </tr>
            </table>
        "#;

        let page = parse_admin_page(html);
        let stamps = page
            .profiles
            .iter()
            .map(|profile| (profile.created_at.as_str(), profile.updated_at.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            stamps,
            vec![
                ("2026-02-19T12:34:56Z", "2026-03-01T08:00:00Z"),
                ("2025-11-02T09:15:00Z", "2025-11-03T10:00:00Z"),
            ]
        );
    }

    #[test]
    fn attribute_entities_are_decoded() {
        let page = parse_admin_page(
            r#"<tr class="profile-row" data-id="7" data-name="a &lt;b&gt; &#x41;&#66;"
                data-title="fish &amp; chips"></tr>"#,
        );
        assert_eq!(page.profiles[0].name, "a <b> AB");
        assert_eq!(page.profiles[0].title, "fish & chips");
    }
}
