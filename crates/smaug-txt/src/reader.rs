//! Parser for SMAUG text model files.
//!
//! Reads back what [`crate::export`] writes so files can be inspected and
//! checked for header/body agreement.

use std::fmt;
use std::path::Path;

use smaug_core::{Result, SmaugError};

use crate::sections::SectionKind;

/// Values of one section body, typed by its `# TYPE` line.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionValues {
    Float(Vec<f32>),
    Int(Vec<i64>),
}

impl SectionValues {
    pub fn len(&self) -> usize {
        match self {
            SectionValues::Float(v) => v.len(),
            SectionValues::Int(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SectionValues::Float(_) => "float",
            SectionValues::Int(_) => "int",
        }
    }
}

/// A weights, data or labels section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionData {
    /// Count declared by the `# NUM_ELEMS` line.
    pub num_elems: usize,
    pub values: SectionValues,
}

impl fmt::Display for SectionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} values of type {} (declared {})",
            self.values.len(),
            self.values.type_name(),
            self.num_elems
        )
    }
}

/// A parsed SMAUG text file.
#[derive(Debug, Clone, PartialEq)]
pub struct TxtModel {
    pub architecture: String,
    pub num_layers: usize,
    pub data_alignment: usize,
    pub weights: SectionData,
    pub data: SectionData,
    pub labels: SectionData,
}

impl TxtModel {
    /// Parse the contents of a file. Sections must appear in file order.
    pub fn parse(text: &str) -> Result<TxtModel> {
        let sections = split_sections(text)?;

        let mut found = sections.iter();
        for kind in SectionKind::ALL {
            match found.next() {
                Some(s) if s.kind == kind => {}
                Some(s) => {
                    return Err(parse_error(
                        s.begin_line,
                        format!("expected {kind} section, found {}", s.kind),
                    ))
                }
                None => {
                    return Err(parse_error(
                        text.lines().count(),
                        format!("missing {kind} section"),
                    ))
                }
            }
        }
        if let Some(extra) = found.next() {
            return Err(parse_error(
                extra.begin_line,
                format!("unexpected second {} section", extra.kind),
            ));
        }

        let (architecture, num_layers, data_alignment) = parse_global(&sections[0])?;
        Ok(TxtModel {
            architecture,
            num_layers,
            data_alignment,
            weights: parse_values(&sections[1])?,
            data: parse_values(&sections[2])?,
            labels: parse_values(&sections[3])?,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<TxtModel> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SmaugError::file(path, e))?;
        Self::parse(&text)
    }

    /// The three value sections with their kinds, in file order.
    pub fn sections(&self) -> [(SectionKind, &SectionData); 3] {
        [
            (SectionKind::Weights, &self.weights),
            (SectionKind::Data, &self.data),
            (SectionKind::Labels, &self.labels),
        ]
    }

    /// Check that every declared element count matches its body and that the
    /// labels section holds a single integer.
    pub fn validate(&self) -> Result<()> {
        for (kind, section) in self.sections() {
            if section.num_elems != section.values.len() {
                return Err(SmaugError::Validation(format!(
                    "{kind} section declares {} elements but holds {}",
                    section.num_elems,
                    section.values.len()
                )));
            }
        }
        match &self.labels.values {
            SectionValues::Int(v) if v.len() == 1 => Ok(()),
            SectionValues::Int(v) => Err(SmaugError::Validation(format!(
                "LABELS section must hold one value, found {}",
                v.len()
            ))),
            SectionValues::Float(_) => Err(SmaugError::Validation(
                "LABELS section must have type int".into(),
            )),
        }
    }

    /// The exported class index, if the labels section holds one.
    pub fn label(&self) -> Option<i64> {
        match &self.labels.values {
            SectionValues::Int(v) => v.first().copied(),
            SectionValues::Float(_) => None,
        }
    }
}

struct RawSection<'a> {
    kind: SectionKind,
    begin_line: usize,
    lines: Vec<(usize, &'a str)>,
}

fn parse_error(line: usize, msg: impl Into<String>) -> SmaugError {
    SmaugError::Parse {
        line,
        msg: msg.into(),
    }
}

/// `===NAME<suffix>===` → `NAME`
fn marker<'a>(line: &'a str, suffix: &str) -> Option<&'a str> {
    line.strip_prefix("===")?
        .strip_suffix("===")?
        .strip_suffix(suffix)
}

fn split_sections(text: &str) -> Result<Vec<RawSection<'_>>> {
    let mut sections = Vec::new();
    let mut current: Option<RawSection<'_>> = None;

    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;
        let line = line.trim();

        if let Some(name) = marker(line, " BEGIN") {
            if let Some(open) = &current {
                return Err(parse_error(
                    lineno,
                    format!("{name} section opened inside {}", open.kind),
                ));
            }
            let kind = SectionKind::from_name(name)
                .ok_or_else(|| parse_error(lineno, format!("unknown section '{name}'")))?;
            current = Some(RawSection {
                kind,
                begin_line: lineno,
                lines: Vec::new(),
            });
        } else if let Some(name) = marker(line, " END") {
            match current.take() {
                Some(open) if open.kind.as_str() == name => sections.push(open),
                Some(open) => {
                    return Err(parse_error(
                        lineno,
                        format!("{name} END does not close {} section", open.kind),
                    ))
                }
                None => return Err(parse_error(lineno, format!("{name} END outside a section"))),
            }
        } else if let Some(open) = current.as_mut() {
            open.lines.push((lineno, line));
        } else if !line.is_empty() {
            return Err(parse_error(lineno, "text outside a section"));
        }
    }

    if let Some(open) = current {
        return Err(parse_error(
            open.begin_line,
            format!("{} section is never closed", open.kind),
        ));
    }
    Ok(sections)
}

fn parse_usize(line: usize, key: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| parse_error(line, format!("{key} must be a non-negative integer, got '{value}'")))
}

fn parse_global(section: &RawSection<'_>) -> Result<(String, usize, usize)> {
    let mut architecture = None;
    let mut num_layers = None;
    let mut data_alignment = None;

    for &(lineno, line) in &section.lines {
        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .strip_prefix('#')
            .and_then(|rest| rest.split_once('='))
            .ok_or_else(|| parse_error(lineno, "expected '# KEY = VALUE'"))?;
        let (key, value) = (key.trim(), value.trim());
        match key {
            "ARCHITECTURE" => architecture = Some(value.to_string()),
            "NUM_LAYERS" => num_layers = Some(parse_usize(lineno, key, value)?),
            "DATA_ALIGNMENT" => data_alignment = Some(parse_usize(lineno, key, value)?),
            _ => tracing::debug!("line {lineno}: ignoring unknown header key {key}"),
        }
    }

    let missing = |key: &str| parse_error(section.begin_line, format!("GLOBAL section lacks {key}"));
    Ok((
        architecture.ok_or_else(|| missing("ARCHITECTURE"))?,
        num_layers.ok_or_else(|| missing("NUM_LAYERS"))?,
        data_alignment.ok_or_else(|| missing("DATA_ALIGNMENT"))?,
    ))
}

fn parse_values(section: &RawSection<'_>) -> Result<SectionData> {
    let mut num_elems = None;
    let mut ty = None;
    let mut body = Vec::new();

    for &(lineno, line) in &section.lines {
        let Some(header) = line.strip_prefix('#') else {
            body.push((lineno, line));
            continue;
        };
        let mut parts = header.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("NUM_ELEMS"), Some(n)) => num_elems = Some(parse_usize(lineno, "NUM_ELEMS", n)?),
            (Some("TYPE"), Some(t @ ("float" | "int"))) => ty = Some(t),
            (Some("TYPE"), Some(t)) => {
                return Err(parse_error(lineno, format!("unknown value type '{t}'")))
            }
            _ => return Err(parse_error(lineno, format!("unrecognised header '{line}'"))),
        }
    }

    let num_elems = num_elems.ok_or_else(|| {
        parse_error(section.begin_line, format!("{} section lacks NUM_ELEMS", section.kind))
    })?;
    let ty = ty.ok_or_else(|| {
        parse_error(section.begin_line, format!("{} section lacks TYPE", section.kind))
    })?;

    let tokens = body.into_iter().flat_map(|(lineno, line)| {
        line.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(move |t| (lineno, t))
    });

    let values = if ty == "int" {
        SectionValues::Int(
            tokens
                .map(|(lineno, t)| {
                    t.parse()
                        .map_err(|_| parse_error(lineno, format!("invalid int value '{t}'")))
                })
                .collect::<Result<_>>()?,
        )
    } else {
        SectionValues::Float(
            tokens
                .map(|(lineno, t)| {
                    t.parse()
                        .map_err(|_| parse_error(lineno, format!("invalid float value '{t}'")))
                })
                .collect::<Result<_>>()?,
        )
    };

    Ok(SectionData { num_elems, values })
}
