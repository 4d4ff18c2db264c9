//! Frame file naming
//!
//! Frame backing files are located with a printf-style numeric template
//! rooted at the clip directory, e.g. `%08u.jpg` or `%s/frame-%u.jpg`.
//!
//! Supported conversions:
//! - `%u`, `%d`, `%i` with optional `0` flag, width and `.precision`
//! - `%s` (at most once) for the clip directory; without it the formatted
//!   name is joined onto the directory
//! - `%%` for a literal percent sign

use std::path::{Path, PathBuf};

use crate::error::{EngineError, EngineResult};

/// Default template: eight zero-padded digits, JPEG extension
pub const DEFAULT_FILE_FORMAT: &str = "%08u.jpg";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Dir,
    Number { width: usize, zero_pad: bool },
}

/// Parsed filename template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameFormat {
    template: String,
    parts: Vec<Part>,
}

impl FilenameFormat {
    /// Parse a template, requiring exactly one numeric conversion
    pub fn parse(template: &str) -> EngineResult<Self> {
        let invalid = |why: &str| EngineError::Config(format!("file format '{}': {}", template, why));

        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut numbers = 0;
        let mut dirs = 0;
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }

            let mut zero_pad = false;
            while let Some(&flag) = chars.peek() {
                match flag {
                    '0' => zero_pad = true,
                    '-' | '+' | ' ' | '#' => {}
                    _ => break,
                }
                chars.next();
            }

            let mut width = take_digits(&mut chars);
            if chars.peek() == Some(&'.') {
                chars.next();
                // Precision is the minimum digit count, always zero-filled
                let precision = take_digits(&mut chars);
                width = width.max(precision);
                zero_pad = true;
            }

            match chars.next() {
                Some('%') => literal.push('%'),
                Some('s') => {
                    dirs += 1;
                    flush(&mut parts, &mut literal);
                    parts.push(Part::Dir);
                }
                Some('u') | Some('d') | Some('i') => {
                    numbers += 1;
                    flush(&mut parts, &mut literal);
                    parts.push(Part::Number { width, zero_pad });
                }
                Some(other) => return Err(invalid(&format!("unsupported conversion '%{}'", other))),
                None => return Err(invalid("dangling '%'")),
            }
        }
        flush(&mut parts, &mut literal);

        if numbers != 1 {
            return Err(invalid("expected exactly one numeric conversion"));
        }
        if dirs > 1 {
            return Err(invalid("directory placeholder '%s' used more than once"));
        }

        Ok(Self {
            template: template.to_string(),
            parts,
        })
    }

    /// The template this format was parsed from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render the file name for `number` without any directory
    pub fn file_name(&self, number: u64) -> String {
        self.render(None, number)
    }

    /// Resolve the backing file path for `number` inside `dir`
    pub fn path(&self, dir: &Path, number: u64) -> PathBuf {
        if self.parts.contains(&Part::Dir) {
            PathBuf::from(self.render(Some(dir), number))
        } else {
            dir.join(self.render(None, number))
        }
    }

    fn render(&self, dir: Option<&Path>, number: u64) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(s) => out.push_str(s),
                Part::Dir => {
                    if let Some(dir) = dir {
                        out.push_str(&dir.to_string_lossy());
                    }
                }
                Part::Number { width, zero_pad } => {
                    if *zero_pad {
                        out.push_str(&format!("{:0width$}", number, width = *width));
                    } else {
                        out.push_str(&format!("{:width$}", number, width = *width));
                    }
                }
            }
        }
        out
    }
}

impl Default for FilenameFormat {
    fn default() -> Self {
        Self {
            template: DEFAULT_FILE_FORMAT.to_string(),
            parts: vec![
                Part::Number {
                    width: 8,
                    zero_pad: true,
                },
                Part::Literal(".jpg".to_string()),
            ],
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> usize {
    let mut value = 0usize;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        value = value.saturating_mul(10).saturating_add(d as usize);
        chars.next();
    }
    value
}

fn flush(parts: &mut Vec<Part>, literal: &mut String) {
    if !literal.is_empty() {
        parts.push(Part::Literal(std::mem::take(literal)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_parsed_default() {
        assert_eq!(
            FilenameFormat::parse(DEFAULT_FILE_FORMAT).unwrap(),
            FilenameFormat::default()
        );
    }

    #[test]
    fn test_zero_padded_width() {
        let fmt = FilenameFormat::parse("%08u.jpg").unwrap();
        assert_eq!(fmt.file_name(6), "00000006.jpg");
        assert_eq!(
            fmt.path(Path::new("/clips/in"), 42),
            PathBuf::from("/clips/in/00000042.jpg")
        );
    }

    #[test]
    fn test_precision_pads_with_zeros() {
        let fmt = FilenameFormat::parse("%.08u.jpg").unwrap();
        assert_eq!(fmt.file_name(7), "00000007.jpg");
    }

    #[test]
    fn test_plain_and_space_padded() {
        assert_eq!(FilenameFormat::parse("frame-%u.png").unwrap().file_name(12), "frame-12.png");
        assert_eq!(FilenameFormat::parse("f%4d").unwrap().file_name(3), "f   3");
    }

    #[test]
    fn test_directory_placeholder() {
        let fmt = FilenameFormat::parse("%s/%05u.jpg").unwrap();
        assert_eq!(
            fmt.path(Path::new("/shots"), 9),
            PathBuf::from("/shots/00009.jpg")
        );
    }

    #[test]
    fn test_literal_percent() {
        let fmt = FilenameFormat::parse("100%%-%u.jpg").unwrap();
        assert_eq!(fmt.file_name(1), "100%-1.jpg");
    }

    #[test]
    fn test_rejects_bad_templates() {
        assert!(FilenameFormat::parse("frame.jpg").is_err());
        assert!(FilenameFormat::parse("%u-%u.jpg").is_err());
        assert!(FilenameFormat::parse("%s/%s/%u.jpg").is_err());
        assert!(FilenameFormat::parse("%x.jpg").is_err());
        assert!(FilenameFormat::parse("%u.jpg%").is_err());
    }
}
