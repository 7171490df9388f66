use regex::{Regex, RegexBuilder};
use smallvec::SmallVec;

use super::{PatternError, PatternResult};

/// Compilation switches, propagated from the owning router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct PatternOptions {
    /// Match letter case exactly instead of ignoring it.
    pub sensitive: bool,
    /// Require the trailing slash to match exactly instead of being optional.
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternKey {
    pub name: String,
    pub optional: bool,
}

pub type KeyList = SmallVec<[PatternKey; 4]>;

/// A registration path compiled into an anchored matcher. Capture group `i`
/// corresponds to key list index `i - 1`; groups past the end of the key list
/// are unnamed.
#[derive(Debug, Clone)]
pub struct PathPattern {
    path: String,
    regex: Regex,
    keys: KeyList,
}

impl PathPattern {
    pub fn compile(path: &str, options: &PatternOptions) -> PatternResult<Self> {
        let (source, keys) = SourceBuilder::new(path).build(options.strict)?;
        let regex = RegexBuilder::new(&source)
            .case_insensitive(!options.sensitive)
            .build()
            .expect("generated route pattern should compile");

        Ok(Self {
            path: path.to_string(),
            regex,
            keys,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn keys(&self) -> &[PatternKey] {
        &self.keys
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// Raw capture list for a whole-path match, in group order. Optional
    /// groups that did not participate come back as `None`. Decoding is the
    /// caller's job.
    pub fn captures(&self, candidate: &str) -> Option<Vec<Option<String>>> {
        let matched = self.regex.captures(candidate)?;
        Some(
            matched
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect(),
        )
    }
}

struct SourceBuilder<'a> {
    path: &'a str,
    chars: Vec<(usize, char)>,
    index: usize,
    source: String,
    keys: KeyList,
}

impl<'a> SourceBuilder<'a> {
    fn new(path: &'a str) -> Self {
        Self {
            path,
            chars: path.char_indices().collect(),
            index: 0,
            source: String::with_capacity(path.len() + 8),
            keys: SmallVec::new(),
        }
    }

    fn build(mut self, strict: bool) -> PatternResult<(String, KeyList)> {
        self.source.push('^');

        while let Some(ch) = self.peek() {
            match ch {
                '/' if self.peek_at(1) == Some(':') => {
                    self.next();
                    self.next();
                    let (name, optional) = self.parse_param_name()?;
                    self.push_key(name)?.optional = optional;
                    if optional {
                        self.source.push_str("(?:/([^/]+?))?");
                    } else {
                        self.source.push_str("/([^/]+?)");
                    }
                }
                ':' if self.index == 0 => {
                    self.next();
                    let (name, optional) = self.parse_param_name()?;
                    self.push_key(name)?.optional = optional;
                    self.source.push_str("([^/]+?)");
                    if optional {
                        self.source.push('?');
                    }
                }
                ':' => {
                    return Err(PatternError::MixedParameterLiteral {
                        path: self.path.to_string(),
                        index: self.byte_index(),
                    });
                }
                '(' => self.parse_group()?,
                _ => {
                    self.next();
                    push_escaped(&mut self.source, ch);
                }
            }
        }

        if !strict {
            self.source.push_str("/?");
        }
        self.source.push('$');

        Ok((self.source, self.keys))
    }

    /// Consumes a parameter name (the `:` is already gone) and its optional
    /// `?` flag, then checks the boundary that follows.
    fn parse_param_name(&mut self) -> PatternResult<(String, bool)> {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                name.push(ch);
                self.next();
            } else {
                break;
            }
        }

        if name.is_empty() {
            return Err(PatternError::ParameterMissingName {
                path: self.path.to_string(),
            });
        }

        let first = name.as_bytes()[0];
        if !(first.is_ascii_alphabetic() || first == b'_') {
            return Err(PatternError::ParameterInvalidStart {
                path: self.path.to_string(),
                name,
                found: first as char,
            });
        }

        let optional = self.peek() == Some('?');
        if optional {
            self.next();
        }

        match self.peek() {
            None | Some('/') => Ok((name, optional)),
            Some(invalid) => Err(PatternError::ParameterInvalidCharacter {
                path: self.path.to_string(),
                name,
                invalid,
            }),
        }
    }

    /// An unnamed group: `|`-separated literal alternatives, optionally
    /// followed by `?`. Produces a capturing group with no key.
    fn parse_group(&mut self) -> PatternResult<()> {
        let start = self.byte_index();
        self.next();

        let mut body = String::new();
        let mut has_content = false;
        let mut closed = false;
        while let Some(ch) = self.next() {
            match ch {
                ')' => {
                    closed = true;
                    break;
                }
                '|' => body.push('|'),
                _ => {
                    has_content = true;
                    push_escaped(&mut body, ch);
                }
            }
        }

        if !closed {
            return Err(PatternError::UnterminatedGroup {
                path: self.path.to_string(),
                start,
            });
        }
        if !has_content {
            return Err(PatternError::EmptyGroup {
                path: self.path.to_string(),
                start,
            });
        }

        self.source.push('(');
        self.source.push_str(&body);
        self.source.push(')');
        if self.peek() == Some('?') {
            self.next();
            self.source.push('?');
        }
        Ok(())
    }

    fn push_key(&mut self, name: String) -> PatternResult<&mut PatternKey> {
        if self.keys.iter().any(|key| key.name == name) {
            return Err(PatternError::DuplicateParamName {
                path: self.path.to_string(),
                name,
            });
        }
        self.keys.push(PatternKey {
            name,
            optional: false,
        });
        Ok(self.keys.last_mut().expect("key was just pushed"))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).map(|(_, ch)| *ch)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).map(|(_, ch)| *ch)
    }

    fn next(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.index += 1;
        }
        ch
    }

    fn byte_index(&self) -> usize {
        self.chars
            .get(self.index)
            .map(|(idx, _)| *idx)
            .unwrap_or(self.path.len())
    }
}

fn push_escaped(target: &mut String, ch: char) {
    if matches!(
        ch,
        '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$' | '\\'
    ) {
        target.push('\\');
    }
    target.push(ch);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(path: &str) -> PathPattern {
        PathPattern::compile(path, &PatternOptions::default()).expect("pattern should compile")
    }

    #[test]
    fn static_path_matches_exactly() {
        let pattern = compile("/users");
        assert!(pattern.is_match("/users"));
        assert!(pattern.is_match("/users/"));
        assert!(!pattern.is_match("/users/7"));
        assert!(!pattern.is_match("/api/users"));
        assert!(pattern.keys().is_empty());
    }

    #[test]
    fn named_parameter_captures_one_segment() {
        let pattern = compile("/users/:id");
        let captures = pattern.captures("/users/42").expect("should match");
        assert_eq!(captures, vec![Some("42".to_string())]);
        assert!(pattern.captures("/users/42/pets").is_none());
        assert_eq!(pattern.keys()[0].name, "id");
        assert!(!pattern.keys()[0].optional);
    }

    #[test]
    fn optional_parameter_may_be_absent() {
        let pattern = compile("/files/:name?");
        assert_eq!(
            pattern.captures("/files/report").unwrap(),
            vec![Some("report".to_string())]
        );
        assert_eq!(pattern.captures("/files").unwrap(), vec![None]);
        assert!(pattern.keys()[0].optional);
    }

    #[test]
    fn keys_follow_occurrence_order() {
        let pattern = compile("/orgs/:org/repos/:repo");
        let names: Vec<_> = pattern.keys().iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["org", "repo"]);
    }

    #[test]
    fn case_insensitive_by_default_sensitive_on_request() {
        let lax = compile("/foo");
        assert!(lax.is_match("/Foo"));

        let strict_case = PathPattern::compile(
            "/foo",
            &PatternOptions {
                sensitive: true,
                strict: false,
            },
        )
        .unwrap();
        assert!(!strict_case.is_match("/Foo"));
        assert!(strict_case.is_match("/foo"));
    }

    #[test]
    fn strict_mode_requires_exact_trailing_slash() {
        let strict = PathPattern::compile(
            "/foo",
            &PatternOptions {
                sensitive: false,
                strict: true,
            },
        )
        .unwrap();
        assert!(strict.is_match("/foo"));
        assert!(!strict.is_match("/foo/"));
    }

    #[test]
    fn unnamed_group_captures_without_a_key() {
        let pattern = compile("/report.(json|xml)");
        assert_eq!(
            pattern.captures("/report.json").unwrap(),
            vec![Some("json".to_string())]
        );
        assert!(pattern.captures("/report.html").is_none());
        assert!(pattern.keys().is_empty());
    }

    #[test]
    fn optional_group_expands_a_literal() {
        let pattern = compile("/user(s)?");
        assert!(pattern.is_match("/user"));
        assert!(pattern.is_match("/users"));
        assert_eq!(pattern.captures("/user").unwrap(), vec![None]);
    }

    #[test]
    fn literal_dots_are_not_wildcards() {
        let pattern = compile("/file.txt");
        assert!(!pattern.is_match("/fileatxt"));
        assert!(pattern.is_match("/file.txt"));
    }

    #[test]
    fn duplicate_parameter_names_are_rejected() {
        let err = PathPattern::compile("/:id/:id", &PatternOptions::default()).unwrap_err();
        match err {
            PatternError::DuplicateParamName { name, .. } => assert_eq!(name, "id"),
            other => panic!("expected DuplicateParamName, got {other:?}"),
        }
    }

    #[test]
    fn parameter_name_must_start_alphabetic() {
        let err = PathPattern::compile("/:1id", &PatternOptions::default()).unwrap_err();
        match err {
            PatternError::ParameterInvalidStart { name, found, .. } => {
                assert_eq!(name, "1id");
                assert_eq!(found, '1');
            }
            other => panic!("expected ParameterInvalidStart, got {other:?}"),
        }
    }

    #[test]
    fn parameter_followed_by_literal_text_is_rejected() {
        let err = PathPattern::compile("/:id-raw", &PatternOptions::default()).unwrap_err();
        match err {
            PatternError::ParameterInvalidCharacter { invalid, .. } => assert_eq!(invalid, '-'),
            other => panic!("expected ParameterInvalidCharacter, got {other:?}"),
        }
    }

    #[test]
    fn mid_segment_colon_is_rejected() {
        let err = PathPattern::compile("/a:b", &PatternOptions::default()).unwrap_err();
        assert!(matches!(err, PatternError::MixedParameterLiteral { .. }));
    }

    #[test]
    fn unterminated_group_is_rejected() {
        let err = PathPattern::compile("/x/(json", &PatternOptions::default()).unwrap_err();
        assert!(matches!(err, PatternError::UnterminatedGroup { .. }));
    }
}
