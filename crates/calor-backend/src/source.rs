//! Kernel program source language.
//!
//! A program is a list of kernel declarations, one per line:
//!
//! ```text
//! // comments run to end of line
//! kernel heat_step(float inner, global const float* src, global float* dst);
//! ```
//!
//! Parameter types are `float`, `uint`, `global const float*`,
//! `global const uint*`, `global float*` and `global uint*`. Every kernel
//! has exactly one writable (non-`const`) global parameter: the buffer
//! that receives one element per work item.

use std::fmt;

use smallvec::SmallVec;

use crate::error::Diagnostic;

/// The type of one kernel parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// `float`
    Float,
    /// `uint`
    Uint,
    /// `global const float*`
    ConstFloatPtr,
    /// `global const uint*`
    ConstUintPtr,
    /// `global float*`
    FloatPtr,
    /// `global uint*`
    UintPtr,
}

impl ParamKind {
    /// Parse a normalized type spelling.
    pub fn from_type_name(name: &str) -> Option<Self> {
        Some(match name {
            "float" => ParamKind::Float,
            "uint" => ParamKind::Uint,
            "global const float*" => ParamKind::ConstFloatPtr,
            "global const uint*" => ParamKind::ConstUintPtr,
            "global float*" => ParamKind::FloatPtr,
            "global uint*" => ParamKind::UintPtr,
            _ => return None,
        })
    }

    /// The source spelling.
    pub fn type_name(self) -> &'static str {
        match self {
            ParamKind::Float => "float",
            ParamKind::Uint => "uint",
            ParamKind::ConstFloatPtr => "global const float*",
            ParamKind::ConstUintPtr => "global const uint*",
            ParamKind::FloatPtr => "global float*",
            ParamKind::UintPtr => "global uint*",
        }
    }

    /// Whether the parameter takes a buffer.
    pub fn is_buffer(self) -> bool {
        !matches!(self, ParamKind::Float | ParamKind::Uint)
    }

    /// Whether the parameter is a writable buffer.
    pub fn is_output(self) -> bool {
        matches!(self, ParamKind::FloatPtr | ParamKind::UintPtr)
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A named kernel parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    /// Declared type.
    pub kind: ParamKind,
    /// Declared name.
    pub name: String,
}

/// One parsed kernel declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelSignature {
    /// Kernel name.
    pub name: String,
    /// Parameters in declaration order.
    pub params: Vec<Param>,
    /// 1-based line of the declaration.
    pub line: usize,
}

impl KernelSignature {
    /// Parameter kinds in declaration order.
    pub fn kinds(&self) -> SmallVec<[ParamKind; 8]> {
        self.params.iter().map(|p| p.kind).collect()
    }

    /// Index of the writable parameter.
    pub fn output_index(&self) -> Option<usize> {
        self.params.iter().position(|p| p.kind.is_output())
    }
}

/// Render a parameter list as `(float, global float*)`.
pub fn format_kinds(kinds: &[ParamKind]) -> String {
    let names: Vec<_> = kinds.iter().map(|k| k.type_name()).collect();
    format!("({})", names.join(", "))
}

/// Parse a program. Returns every declaration, or every diagnostic.
///
/// ```
/// use calor_backend::source::parse;
/// use calor_backend::ParamKind;
///
/// let decls = parse("kernel copy(global const uint* a, global uint* b);").unwrap();
/// assert_eq!(decls[0].name, "copy");
/// assert_eq!(decls[0].params[1].kind, ParamKind::UintPtr);
///
/// let errs = parse("\nkernel broken(double x);").unwrap_err();
/// assert_eq!(errs[0].line, 2);
/// ```
pub fn parse(source: &str) -> Result<Vec<KernelSignature>, Vec<Diagnostic>> {
    let mut decls: Vec<KernelSignature> = Vec::new();
    let mut diags = Vec::new();

    for (i, raw) in source.lines().enumerate() {
        let line = i + 1;
        let text = match raw.find("//") {
            Some(pos) => &raw[..pos],
            None => raw,
        }
        .trim();
        if text.is_empty() {
            continue;
        }
        match parse_decl(text, line) {
            Ok(sig) => {
                if let Some(prev) = decls.iter().find(|d| d.name == sig.name) {
                    diags.push(Diagnostic::new(
                        line,
                        format!(
                            "kernel '{}' already declared on line {}",
                            sig.name, prev.line
                        ),
                    ));
                } else {
                    decls.push(sig);
                }
            }
            Err(mut errs) => diags.append(&mut errs),
        }
    }

    if decls.is_empty() && diags.is_empty() {
        diags.push(Diagnostic::new(1, "program declares no kernels"));
    }
    if diags.is_empty() {
        Ok(decls)
    } else {
        Err(diags)
    }
}

fn parse_decl(text: &str, line: usize) -> Result<KernelSignature, Vec<Diagnostic>> {
    let err = |msg: String| vec![Diagnostic::new(line, msg)];

    let rest = text
        .strip_prefix("kernel")
        .filter(|r| r.starts_with(char::is_whitespace))
        .ok_or_else(|| err(format!("expected 'kernel', found '{text}'")))?
        .trim_start();
    let rest = rest
        .strip_suffix(';')
        .ok_or_else(|| err("expected ';' at end of declaration".into()))?
        .trim_end();
    let open = rest
        .find('(')
        .ok_or_else(|| err("expected '(' after kernel name".into()))?;
    let body = rest[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| err("expected ')' closing the parameter list".into()))?;
    let name = rest[..open].trim();
    if !is_identifier(name) {
        return Err(err(format!("invalid kernel name '{name}'")));
    }

    let mut diags = Vec::new();
    let mut params: Vec<Param> = Vec::new();
    if !body.trim().is_empty() {
        for (pos, piece) in body.split(',').enumerate() {
            match parse_param(piece.trim()) {
                Ok(p) => {
                    if params.iter().any(|q| q.name == p.name) {
                        diags.push(Diagnostic::new(
                            line,
                            format!("duplicate parameter '{}' in kernel '{name}'", p.name),
                        ));
                    }
                    params.push(p);
                }
                Err(msg) => diags.push(Diagnostic::new(
                    line,
                    format!("parameter {} of kernel '{name}': {msg}", pos + 1),
                )),
            }
        }
    }

    if diags.is_empty() {
        let outputs = params.iter().filter(|p| p.kind.is_output()).count();
        if outputs != 1 {
            diags.push(Diagnostic::new(
                line,
                format!("kernel '{name}' must have exactly one writable buffer, found {outputs}"),
            ));
        }
    }

    if diags.is_empty() {
        Ok(KernelSignature {
            name: name.to_string(),
            params,
            line,
        })
    } else {
        Err(diags)
    }
}

fn parse_param(text: &str) -> Result<Param, String> {
    if text.is_empty() {
        return Err("empty parameter".into());
    }
    let split = text
        .char_indices()
        .rev()
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_'))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let (ty, name) = text.split_at(split);
    if !is_identifier(name) {
        return Err(format!("missing parameter name in '{text}'"));
    }
    let ty = normalize_type(ty);
    if ty.is_empty() {
        return Err(format!("missing type for '{name}'"));
    }
    let kind = ParamKind::from_type_name(&ty).ok_or_else(|| format!("unknown type '{ty}'"))?;
    Ok(Param {
        kind,
        name: name.to_string(),
    })
}

/// Collapse whitespace and attach `*` to the preceding word.
fn normalize_type(ty: &str) -> String {
    let spaced = ty.replace('*', " * ");
    let mut out = String::new();
    for word in spaced.split_whitespace() {
        if word == "*" {
            out.push('*');
        } else {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEAT: &str = "\
// heat program
kernel heat_step(float inner, float outer, uint edge,
";

    #[test]
    fn parses_full_signature() {
        let src = "kernel k(float a, uint b, global const uint* c, global const float *d, global float* e);";
        let decls = parse(src).unwrap();
        assert_eq!(decls.len(), 1);
        let k = &decls[0];
        assert_eq!(
            k.kinds().as_slice(),
            &[
                ParamKind::Float,
                ParamKind::Uint,
                ParamKind::ConstUintPtr,
                ParamKind::ConstFloatPtr,
                ParamKind::FloatPtr,
            ]
        );
        assert_eq!(k.params[3].name, "d");
        assert_eq!(k.output_index(), Some(4));
        assert_eq!(k.line, 1);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let src = "// header\n\n   kernel a(global uint* o); // trailing\n";
        let decls = parse(src).unwrap();
        assert_eq!(decls[0].name, "a");
        assert_eq!(decls[0].line, 3);
    }

    #[test]
    fn unterminated_declaration_reports_its_line() {
        let errs = parse(HEAT).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].line, 2);
        assert!(errs[0].message.contains("';'"));
    }

    #[test]
    fn unknown_type_is_reported() {
        let errs = parse("kernel k(global double* o);").unwrap_err();
        assert!(errs[0].message.contains("unknown type 'global double*'"));
    }

    #[test]
    fn every_bad_line_is_reported() {
        let src = "kernel a(int x);\nkernel b(global uint* o);\nnonsense\n";
        let errs = parse(src).unwrap_err();
        let lines: Vec<_> = errs.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![1, 3]);
    }

    #[test]
    fn output_count_is_enforced() {
        let none = parse("kernel a(float x, global const float* y);").unwrap_err();
        assert!(none[0].message.contains("found 0"));
        let two = parse("kernel a(global float* x, global uint* y);").unwrap_err();
        assert!(two[0].message.contains("found 2"));
    }

    #[test]
    fn duplicates_are_rejected() {
        let errs = parse("kernel a(global uint* o);\nkernel a(global uint* o);").unwrap_err();
        assert_eq!(errs[0].line, 2);
        assert!(errs[0].message.contains("already declared on line 1"));

        let errs = parse("kernel a(float x, global uint* x);").unwrap_err();
        assert!(errs[0].message.contains("duplicate parameter 'x'"));
    }

    #[test]
    fn empty_program_is_an_error() {
        let errs = parse("// nothing here\n").unwrap_err();
        assert_eq!(errs[0].message, "program declares no kernels");
    }

    #[test]
    fn type_spelling_round_trips() {
        for kind in [
            ParamKind::Float,
            ParamKind::Uint,
            ParamKind::ConstFloatPtr,
            ParamKind::ConstUintPtr,
            ParamKind::FloatPtr,
            ParamKind::UintPtr,
        ] {
            assert_eq!(ParamKind::from_type_name(kind.type_name()), Some(kind));
        }
        assert_eq!(normalize_type("global   const float  *"), "global const float*");
    }

    #[test]
    fn format_kinds_lists_types() {
        assert_eq!(
            format_kinds(&[ParamKind::Float, ParamKind::UintPtr]),
            "(float, global uint*)"
        );
    }
}
