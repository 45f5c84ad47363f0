//! Pretty-printable diagnostic reports for [`Notice`], rendered with
//! source-line context the way a compiler's CLI front end would present
//! them (spec.md §6: "Diagnostic output").
//!
//! The core never opens files; [`SourceMap`] is supplied by the host,
//! mapping each [`FileId`] it registered to the source text read from it.

use crate::diagnostics::Notice;
use crate::node::{FileId, NodeLocation};
use ariadne::{ColorGenerator, Label, Report, ReportKind};
use std::collections::HashMap;
use std::fmt;

/// Source text for every file the host wants diagnostics to be able to
/// quote from, keyed by the `FileId` it assigned when registering the file.
#[derive(Default)]
pub struct SourceMap {
    files: HashMap<FileId, ariadne::Source<String>>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, file: FileId, text: impl Into<String>) {
        self.files.insert(file, ariadne::Source::from(text.into()));
    }
}

impl ariadne::Cache<FileId> for &SourceMap {
    type Storage = String;

    fn fetch(&mut self, file_id: &FileId) -> Result<&ariadne::Source<String>, Box<dyn fmt::Debug + '_>> {
        struct NotFound(FileId);
        impl fmt::Debug for NotFound {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "source file not registered: {:?}", self.0)
            }
        }
        self.files.get(file_id).ok_or_else(|| {
            let boxed: Box<dyn fmt::Debug> = Box::new(NotFound(*file_id));
            boxed
        })
    }

    fn display<'a>(&self, file_id: &'a FileId) -> Option<Box<dyn fmt::Display + 'a>> {
        struct Shown(FileId);
        impl fmt::Display for Shown {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.0 == FileId::SYNTHETIC {
                    f.write_str("<synthetic>")
                } else {
                    write!(f, "file#{}", self.0 .0)
                }
            }
        }
        Some(Box::new(Shown(*file_id)))
    }
}

/// Renders one notice into an `ariadne` report quoting its source span.
fn report_for(notice: &Notice, colors: &mut ColorGenerator) -> Report<'static, (FileId, std::ops::Range<usize>)> {
    let location = notice.location();
    let file = location.map(|l| l.file).unwrap_or(FileId::SYNTHETIC);
    let span = location.map(NodeLocation::span).unwrap_or(0..0);
    let mut builder = Report::build(ReportKind::Error, file, span.start).with_message(notice.to_string());
    builder.add_label(
        Label::new((file, span))
            .with_message(notice.to_string())
            .with_color(colors.next()),
    );
    builder.finish()
}

/// Renders every accumulated notice into one human-readable, colorized
/// report string, quoting source context for notices whose file was
/// registered in `sources`.
pub fn render_notices(notices: &[Notice], sources: &SourceMap) -> String {
    let mut colors = ColorGenerator::new();
    let mut out = Vec::new();
    for notice in notices {
        let report = report_for(notice, &mut colors);
        if report.write(sources, &mut out).is_err() {
            out.extend_from_slice(format!("{notice}\n").as_bytes());
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
