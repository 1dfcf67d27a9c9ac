use std::{collections::HashMap, fmt, sync::Arc};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

use crate::{http::request::Request, routing::PathState};

use super::Filter;

/// Matcher for one pattern segment.
pub trait PathWisp: Send + Sync + 'static + fmt::Debug {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
    /// Whether the wisp swallows every remaining segment.
    fn consumes_rest(&self) -> bool {
        false
    }
    fn detect(&self, state: &mut PathState) -> bool;
}

/// Builds the wisp for a `<name:sign>` segment.
pub trait WispBuilder: Send + Sync {
    fn build(&self, name: String, sign: String) -> Result<Box<dyn PathWisp>, String>;
}

type WispBuilderMap = RwLock<HashMap<String, Arc<dyn WispBuilder>>>;

static WISP_BUILDERS: Lazy<WispBuilderMap> = Lazy::new(|| {
    let mut map: HashMap<String, Arc<dyn WispBuilder>> = HashMap::with_capacity(8);
    map.insert("num".into(), Arc::new(CharWispBuilder::new(is_num)));
    map.insert("hex".into(), Arc::new(CharWispBuilder::new(is_hex)));
    RwLock::new(map)
});

/// Registers a builder usable as `<name:sign>` in path patterns.
pub fn add_wisp_builder<B>(sign: impl Into<String>, builder: B)
where
    B: WispBuilder + 'static,
{
    WISP_BUILDERS.write().insert(sign.into(), Arc::new(builder));
}

fn is_num(ch: char) -> bool {
    ch.is_ascii_digit()
}
fn is_hex(ch: char) -> bool {
    ch.is_ascii_hexdigit()
}

#[derive(Debug)]
struct RegexWisp {
    name: String,
    regex: Regex,
}
impl PartialEq for RegexWisp {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.regex.as_str() == other.regex.as_str()
    }
}
impl PathWisp for RegexWisp {
    fn detect(&self, state: &mut PathState) -> bool {
        let picked = match state.pick() {
            Some(picked) if self.regex.is_match(picked) => picked.to_owned(),
            _ => return false,
        };
        state.forward(picked.len());
        state.params.insert(self.name.clone(), picked);
        true
    }
}

struct CharWisp<C> {
    name: String,
    checker: Arc<C>,
}
impl<C> fmt::Debug for CharWisp<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CharWisp {{ name: {:?} }}", self.name)
    }
}
impl<C> PathWisp for CharWisp<C>
where
    C: Fn(char) -> bool + Send + Sync + 'static,
{
    fn detect(&self, state: &mut PathState) -> bool {
        let picked = match state.pick() {
            Some(picked) if !picked.is_empty() && picked.chars().all(|ch| (self.checker)(ch)) => {
                picked.to_owned()
            }
            _ => return false,
        };
        state.forward(picked.len());
        state.params.insert(self.name.clone(), picked);
        true
    }
}

/// Accepts a segment whose characters all pass `checker`.
pub struct CharWispBuilder<C>(Arc<C>);
impl<C> CharWispBuilder<C> {
    pub fn new(checker: C) -> Self {
        Self(Arc::new(checker))
    }
}
impl<C> WispBuilder for CharWispBuilder<C>
where
    C: Fn(char) -> bool + Send + Sync + 'static,
{
    fn build(&self, name: String, _sign: String) -> Result<Box<dyn PathWisp>, String> {
        Ok(Box::new(CharWisp {
            name,
            checker: Arc::clone(&self.0),
        }))
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
enum Span {
    /// `<name>`: exactly one segment.
    Segment,
    /// `<*name>`: one or more segments.
    Rest,
    /// `<**name>`: zero or more segments.
    OptionalRest,
}

#[derive(Debug, Eq, PartialEq)]
struct NamedWisp {
    name: String,
    span: Span,
}
impl PathWisp for NamedWisp {
    fn consumes_rest(&self) -> bool {
        self.span != Span::Segment
    }
    fn detect(&self, state: &mut PathState) -> bool {
        match self.span {
            Span::Segment => {
                let picked = match state.pick() {
                    Some(picked) => picked.to_owned(),
                    None => return false,
                };
                state.forward(picked.len());
                state.params.insert(self.name.clone(), picked);
                true
            }
            Span::Rest | Span::OptionalRest => {
                let rest = state.all_rest().map(|rest| rest.into_owned());
                match rest {
                    Some(rest) if !rest.is_empty() => {
                        state.params.insert(self.name.clone(), rest);
                    }
                    _ if self.span == Span::OptionalRest => {
                        state.params.insert(self.name.clone(), String::new());
                    }
                    _ => return false,
                }
                state.cursor = (state.parts.len(), 0);
                true
            }
        }
    }
}

#[derive(Eq, PartialEq, Debug)]
struct ConstWisp(String);
impl PathWisp for ConstWisp {
    fn detect(&self, state: &mut PathState) -> bool {
        match state.pick() {
            Some(picked) if picked == self.0 => {
                state.forward(self.0.len());
                true
            }
            _ => false,
        }
    }
}

/// Splits a pattern into segments, keeping `/` inside `<name:/regex/>` intact.
struct PathParser<'a> {
    raw_value: &'a str,
}

impl<'a> PathParser<'a> {
    fn new(raw_value: &'a str) -> PathParser<'a> {
        PathParser { raw_value }
    }

    fn parse(&self) -> Result<Vec<Box<dyn PathWisp>>, String> {
        let segments = self.scan_segments()?;
        let mut wisps: Vec<Box<dyn PathWisp>> = Vec::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            let wisp = self.scan_segment(segment)?;
            if wisp.consumes_rest() && index + 1 != segments.len() {
                return Err(format!("rest segment `{}` must be the last one", segment));
            }
            wisps.push(wisp);
        }
        Ok(wisps)
    }

    fn scan_segments(&self) -> Result<Vec<String>, String> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = self.raw_value.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '/' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
                '<' => {
                    current.push(ch);
                    let mut prev = ch;
                    let mut in_regex = false;
                    let mut closed = false;
                    while let Some(ch) = chars.next() {
                        current.push(ch);
                        if !in_regex && prev == ':' && ch == '/' {
                            in_regex = true;
                        } else if in_regex && ch == '/' && chars.peek() == Some(&'>') {
                            in_regex = false;
                        } else if !in_regex && ch == '>' {
                            closed = true;
                            break;
                        }
                        prev = ch;
                    }
                    if !closed {
                        return Err("`<` is not closed".to_owned());
                    }
                }
                _ => current.push(ch),
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        Ok(segments)
    }

    fn scan_segment(&self, segment: &str) -> Result<Box<dyn PathWisp>, String> {
        if !segment.contains('<') && !segment.contains('>') {
            return Ok(Box::new(ConstWisp(segment.to_owned())));
        }
        let inner = segment
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .ok_or_else(|| format!("segment `{}` mixes constant text and a parameter", segment))?;
        let (name, sign) = match inner.split_once(':') {
            Some((name, sign)) => (name, Some(sign)),
            None => (inner, None),
        };

        let stars = name.len() - name.trim_start_matches('*').len();
        let ident = &name[stars..];
        if ident.is_empty() || !ident.chars().all(|ch| ch.is_alphanumeric() || ch == '_') {
            return Err(format!("invalid parameter name `{}`", name));
        }
        let span = match stars {
            0 => Span::Segment,
            1 => Span::Rest,
            2 => Span::OptionalRest,
            _ => return Err(format!("too many `*` in `{}`", name)),
        };

        match sign {
            None => Ok(Box::new(NamedWisp {
                name: ident.to_owned(),
                span,
            })),
            Some(_) if span != Span::Segment => {
                Err(format!("rest parameter `{}` cannot be constrained", name))
            }
            Some(sign) if sign.len() >= 2 && sign.starts_with('/') && sign.ends_with('/') => {
                let regex = Regex::new(&format!("^(?:{})$", &sign[1..sign.len() - 1]))
                    .map_err(|e| e.to_string())?;
                Ok(Box::new(RegexWisp {
                    name: ident.to_owned(),
                    regex,
                }))
            }
            Some(sign) => {
                let builder = WISP_BUILDERS
                    .read()
                    .get(sign)
                    .cloned()
                    .ok_or_else(|| format!("no wisp builder registered for `{}`", sign))?;
                builder.build(ident.to_owned(), sign.to_owned())
            }
        }
    }
}

pub struct PathFilter {
    raw_value: String,
    path_wisps: Vec<Box<dyn PathWisp>>,
}

impl fmt::Debug for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path:{}", self.raw_value)
    }
}

impl PathFilter {
    /// # Panics
    ///
    /// Panics if the pattern is invalid; routes are built at startup.
    pub fn new(value: impl Into<String>) -> Self {
        match Self::try_new(value) {
            Ok(filter) => filter,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, String> {
        let raw_value = value.into();
        let path_wisps = PathParser::new(&raw_value)
            .parse()
            .map_err(|e| format!("{}, raw_value: {}", e, raw_value))?;
        Ok(PathFilter {
            raw_value,
            path_wisps,
        })
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn detect(&self, state: &mut PathState) -> bool {
        let original_cursor = state.cursor;
        for wisp in &self.path_wisps {
            if !wisp.detect(state) {
                state.cursor = original_cursor;
                return false;
            }
        }
        true
    }
}

impl Filter for PathFilter {
    fn filter(&self, _req: &mut Request, state: &mut PathState) -> bool {
        self.detect(state)
    }
}
