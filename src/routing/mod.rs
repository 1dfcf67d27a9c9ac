use std::{borrow::Cow, collections::HashMap};

mod dispatch;
pub mod filter;
mod router;

pub use dispatch::{RequestRouter, RouteNotFound};
pub use filter::*;
pub use router::{DetectMatched, Router};

/// Route variables bound while matching.
pub type PathParams = HashMap<String, String>;

/// Matching cursor over the decoded segments of a request path.
///
/// `cursor` is `(segment index, byte offset inside the segment)`.
#[derive(Debug)]
pub struct PathState {
    pub(crate) parts: Vec<String>,
    pub(crate) cursor: (usize, usize),
    pub(crate) params: PathParams,
    pub(crate) end_slash: bool,
}

impl PathState {
    pub fn new(url_path: &str) -> Self {
        let end_slash = url_path.ends_with('/');
        let parts = url_path
            .trim_start_matches('/')
            .trim_end_matches('/')
            .split('/')
            .filter_map(|p| {
                if !p.is_empty() {
                    Some(decode_url_path_safely(p))
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();

        PathState {
            parts,
            cursor: (0, 0),
            params: PathParams::new(),
            end_slash,
        }
    }

    fn position(&self) -> Option<(usize, usize)> {
        let part = self.parts.get(self.cursor.0)?;
        if self.cursor.1 >= part.len() {
            let row = self.cursor.0 + 1;
            self.parts.get(row).map(|_| (row, 0))
        } else {
            Some(self.cursor)
        }
    }

    /// The unconsumed rest of the current segment.
    pub fn pick(&self) -> Option<&str> {
        self.position()
            .map(|(row, offset)| &self.parts[row][offset..])
    }

    /// Everything not yet consumed, segments joined with `/`.
    pub fn all_rest(&self) -> Option<Cow<'_, str>> {
        let (row, offset) = self.position()?;
        let picked = &self.parts[row][offset..];
        let rest = if row + 1 < self.parts.len() {
            Cow::Owned(format!("{}/{}", picked, self.parts[row + 1..].join("/")))
        } else {
            Cow::Borrowed(picked)
        };
        if self.end_slash {
            Some(Cow::Owned(format!("{}/", rest)))
        } else {
            Some(rest)
        }
    }

    /// Moves the cursor forward by `steps` bytes, crossing segment boundaries.
    pub fn forward(&mut self, steps: usize) {
        let mut steps = steps + self.cursor.1;
        while let Some(part) = self.parts.get(self.cursor.0) {
            if part.len() > steps {
                self.cursor.1 = steps;
                return;
            } else {
                steps -= part.len();
                self.cursor = (self.cursor.0 + 1, 0);
            }
        }
    }

    pub fn ended(&self) -> bool {
        self.cursor.0 >= self.parts.len()
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }
}

fn decode_url_path_safely(path: &str) -> String {
    percent_encoding::percent_decode_str(path)
        .decode_utf8_lossy()
        .to_string()
}
