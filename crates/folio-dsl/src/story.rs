//! Story repository: every parsed page plus the pattern templates used to
//! build them.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use folio_core::{Page, Pattern, Properties};
use serde::Serialize;
use strsim::jaro_winkler;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{DslError, DslResult};
use crate::page::parse_page;
use crate::tokenizer::{self, ASSIGN, BRACKET, BRACKET_OPEN, clean_whitespace};

/// Minimum similarity score for "did you mean" suggestions (0.0-1.0).
const FUZZY_THRESHOLD: f64 = 0.8;

/// A parsed story: nouns mapped to pages, names mapped to patterns.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Story {
    pages: Vec<Page>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    patterns: BTreeMap<String, Pattern>,
}

/// Header of a keyword definition, `[noun[pattern]=init]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Header<'a> {
    noun: String,
    pattern: Option<String>,
    init: Option<&'a str>,
}

fn parse_header(header: &str) -> Result<Header<'_>, String> {
    let name_end =
        tokenizer::find_first_of(header, 0, &[BRACKET_OPEN, ASSIGN]).unwrap_or(header.len());
    let noun = tokenizer::unescape(header[..name_end].trim());
    if noun.is_empty() {
        return Err("definition without a noun name".to_string());
    }

    let mut rest = &header[name_end..];
    let mut pattern = None;
    if rest.starts_with(BRACKET_OPEN) {
        let end = tokenizer::find_token_end(rest, 0, BRACKET)
            .ok_or_else(|| format!("unmatched `[` in header of [{noun}]"))?;
        pattern = Some(tokenizer::unescape(rest[1..end - 1].trim()));
        rest = rest[end..].trim_start();
    }

    let init = match rest.strip_prefix(ASSIGN) {
        Some(init) => Some(init),
        None if rest.trim().is_empty() => None,
        None => return Err(format!("unexpected {:?} in header of [{noun}]", rest.trim())),
    };

    Ok(Header {
        noun,
        pattern,
        init,
    })
}

impl Story {
    /// Create an empty story.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one keyword definition, `[noun[pattern]=init]body`, whose
    /// comments are already stripped. `origin` locates the header in the
    /// story source for diagnostics.
    ///
    /// The pattern-definition form `[name[name]]template` registers a pattern
    /// whose placeholder is its own name. Returns whether a page or pattern
    /// was added.
    pub fn parse_keyword_definition(
        &mut self,
        definition: &str,
        origin: Range<usize>,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        let definition = definition.trim_start();
        let Some(header_end) = tokenizer::find_token_end(definition, 0, BRACKET) else {
            diagnostics.error(origin, "unmatched `[` in definition header");
            return false;
        };
        let header = match parse_header(&definition[1..header_end - 1]) {
            Ok(header) => header,
            Err(message) => {
                diagnostics.error(origin, message);
                return false;
            }
        };
        let body = &definition[header_end..];

        if header.pattern.as_deref() == Some(header.noun.as_str()) {
            if header.init.is_some() {
                diagnostics.push(
                    Diagnostic::warning(origin.clone(), "pattern definitions take no value")
                        .with_label(format!("in [{}]", header.noun)),
                );
            }
            let pattern = Pattern::new(header.noun.clone(), header.noun, body.trim());
            return self.add_pattern(pattern, origin, diagnostics);
        }

        if self.index.contains_key(&header.noun) {
            diagnostics.error(origin, format!("duplicate noun: [{}]", header.noun));
            return false;
        }

        let text = match &header.pattern {
            Some(name) => match self.patterns.get(name) {
                Some(pattern) => format!("{}{body}", pattern.expand(&header.noun)),
                None => {
                    let mut d = Diagnostic::error(origin.clone(), format!("unknown pattern: {name}"));
                    if let Some(suggestion) = suggest(self.patterns.keys(), name) {
                        d = d.with_label(format!("did you mean \"{suggestion}\"?"));
                    }
                    diagnostics.push(d);
                    body.to_string()
                }
            },
            None => body.to_string(),
        };

        let defaults = match header.init.map(str::trim) {
            Some(init) => Properties::try_parse(init).unwrap_or_else(|e| {
                diagnostics.push(
                    Diagnostic::error(origin.clone(), e.to_string())
                        .with_label(format!("in [{}]", header.noun)),
                );
                Properties::parse(init)
            }),
            None => Properties::new(),
        };

        let page = Page::new(header.noun).with_defaults(defaults);
        let page = parse_page(page, &clean_whitespace(&text), origin, diagnostics);
        tracing::debug!(noun = %page.name, verbs = page.verbs().len(), "page parsed");
        self.insert_page(page);
        true
    }

    /// Register a pattern. A name that is already taken is reported and ignored.
    pub fn register_pattern(
        &mut self,
        name: &str,
        placeholder: &str,
        template: &str,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        self.add_pattern(Pattern::new(name, placeholder, template), 0..0, diagnostics)
    }

    fn add_pattern(
        &mut self,
        pattern: Pattern,
        origin: Range<usize>,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        if self.patterns.contains_key(&pattern.name) {
            diagnostics.error(origin, format!("duplicate pattern: {}", pattern.name));
            return false;
        }
        tracing::debug!(pattern = %pattern.name, "pattern registered");
        self.patterns.insert(pattern.name.clone(), pattern);
        true
    }

    fn insert_page(&mut self, page: Page) {
        self.index.insert(page.name.clone(), self.pages.len());
        self.pages.push(page);
    }

    /// Add an already built page.
    pub fn add_page(&mut self, page: Page) -> DslResult<()> {
        if self.index.contains_key(&page.name) {
            return Err(DslError::DuplicateNoun(page.name));
        }
        self.insert_page(page);
        Ok(())
    }

    /// Look up a page by noun.
    pub fn find_page(&self, noun: &str) -> Option<&Page> {
        self.index.get(noun).and_then(|&i| self.pages.get(i))
    }

    /// Look up a page by noun, reporting a miss with a suggestion.
    pub fn lookup(&self, noun: &str, diagnostics: &mut Diagnostics) -> Option<&Page> {
        let page = self.find_page(noun);
        if page.is_none() {
            let mut d = Diagnostic::error(0..0, format!("page not found: [{noun}]"));
            if let Some(suggestion) = self.suggest(noun) {
                d = d.with_label(format!("did you mean \"{suggestion}\"?"));
            }
            diagnostics.push(d);
        }
        page
    }

    /// Closest noun to `noun`, if any is similar enough.
    pub fn suggest(&self, noun: &str) -> Option<String> {
        suggest(self.pages.iter().map(|p| &p.name), noun)
    }

    /// Look up a pattern by name.
    pub fn pattern(&self, name: &str) -> Option<&Pattern> {
        self.patterns.get(name)
    }

    /// Pages in definition order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter()
    }

    /// Number of pages, patterns excluded.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of pattern pages.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

fn suggest<'a>(candidates: impl Iterator<Item = &'a String>, input: &str) -> Option<String> {
    let input_lower = input.to_lowercase();
    candidates
        .map(|name| (name, jaro_winkler(&input_lower, &name.to_lowercase())))
        .filter(|(_, score)| *score >= FUZZY_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(name, _)| name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn define(story: &mut Story, definition: &str) -> (bool, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let added = story.parse_keyword_definition(definition, 0..0, &mut diagnostics);
        (added, diagnostics)
    }

    #[test]
    fn header_forms() {
        assert_eq!(
            parse_header("north[foo]=a,b").unwrap(),
            Header {
                noun: "north".to_string(),
                pattern: Some("foo".to_string()),
                init: Some("a,b"),
            }
        );
        assert_eq!(parse_header("apple").unwrap().init, None);
        assert!(parse_header("").is_err());
        assert!(parse_header("apple[foo").is_err());
    }

    #[test]
    fn defaults_from_init() {
        let mut story = Story::new();
        let (added, diags) = define(&mut story, "[apple=red,green]\n[:eat]\"Crunch.\"");
        assert!(added);
        assert!(diags.is_empty(), "{:?}", diags.as_slice());
        let page = story.find_page("apple").unwrap();
        assert!(page.defaults.contains("red"));
        assert!(page.defaults.contains("green"));
        assert!(page.find_verb("eat").is_some());
    }

    #[test]
    fn invalid_init_falls_back_leniently() {
        let mut story = Story::new();
        let (added, diags) = define(&mut story, "[coin=gold,#x]");
        assert!(added);
        assert!(diags.has_errors());
        assert!(story.find_page("coin").unwrap().defaults.contains("gold"));
    }

    #[test]
    fn duplicate_noun_rejected() {
        let mut story = Story::new();
        define(&mut story, "[apple]");
        let (added, diags) = define(&mut story, "[apple]");
        assert!(!added);
        assert!(diags.iter().any(|d| d.message.contains("duplicate noun")));
        assert_eq!(story.page_count(), 1);
    }

    #[test]
    fn pattern_expansion_matches_literal_authoring() {
        let mut expanded = Story::new();
        let mut diags = Diagnostics::new();
        assert!(expanded.register_pattern("foo", "door", "\"A @door.\"", &mut diags));
        define(&mut expanded, "[north[foo]]");

        let mut literal = Story::new();
        define(&mut literal, "[north]\"A @north.\"");

        let a = expanded.find_page("north").unwrap();
        let b = literal.find_page("north").unwrap();
        assert_eq!(a.source, b.source);
        assert_eq!(a.source, "\"A @north.\"");
    }

    #[test]
    fn pattern_definition_form() {
        let mut story = Story::new();
        let (added, _) = define(&mut story, "[door[door]][:knock]\"The door rattles.\"");
        assert!(added);
        assert_eq!(story.page_count(), 0);
        assert_eq!(story.pattern("door").unwrap().placeholder, "door");

        define(&mut story, "[gate[door]=shut]");
        let gate = story.find_page("gate").unwrap();
        assert!(gate.find_verb("knock").is_some());
        assert!(gate.source.contains("The gate rattles."));
        assert!(gate.defaults.contains("shut"));
    }

    #[test]
    fn duplicate_and_unknown_patterns() {
        let mut story = Story::new();
        let mut diags = Diagnostics::new();
        assert!(story.register_pattern("door", "door", "", &mut diags));
        assert!(!story.register_pattern("door", "door", "", &mut diags));
        assert!(diags.iter().any(|d| d.message.contains("duplicate pattern")));

        let (added, diags) = define(&mut story, "[gate[dor]]");
        assert!(added);
        let d = diags.iter().find(|d| d.message.contains("unknown pattern")).unwrap();
        assert_eq!(d.label.as_deref(), Some("did you mean \"door\"?"));
    }

    #[test]
    fn lookup_miss_suggests() {
        let mut story = Story::new();
        define(&mut story, "[apple]");
        let mut diags = Diagnostics::new();
        assert!(story.lookup("aple", &mut diags).is_none());
        assert_eq!(
            diags.as_slice()[0].label.as_deref(),
            Some("did you mean \"apple\"?")
        );
        assert!(story.lookup("apple", &mut diags).is_some());
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn add_page_rejects_taken_noun() {
        let mut story = Story::new();
        assert!(story.add_page(Page::new("lamp")).is_ok());
        let err = story.add_page(Page::new("lamp")).unwrap_err();
        assert!(matches!(err, DslError::DuplicateNoun(n) if n == "lamp"));
    }
}
