use serde::Serialize;

use crate::core::{Annotation, AnnotationId, TierId};

// ---------------------------------------------------------------------------
// AnnotationRef — attribution of a diagnostic to one annotation
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnnotationRef {
    pub tier: TierId,
    pub annotation: AnnotationId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<AnnotationRef>,
}

// ---------------------------------------------------------------------------
// Diagnostics — append-only error/warning collector for one document
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(Diagnostic {
            message: message.into(),
            annotation: None,
        });
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(Diagnostic {
            message: message.into(),
            annotation: None,
        });
    }

    /// Records an error both on the annotation and in the document list.
    pub fn annotation_error(&mut self, tier: &TierId, ann: &mut Annotation, message: String) {
        ann.errors.push(message.clone());
        self.errors.push(Diagnostic {
            message,
            annotation: Some(AnnotationRef {
                tier: tier.clone(),
                annotation: ann.id.clone(),
            }),
        });
    }

    /// Records a warning both on the annotation and in the document list.
    pub fn annotation_warning(&mut self, tier: &TierId, ann: &mut Annotation, message: String) {
        ann.warnings.push(message.clone());
        self.warnings.push(Diagnostic {
            message,
            annotation: Some(AnnotationRef {
                tier: tier.clone(),
                annotation: ann.id.clone(),
            }),
        });
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn error_messages(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|d| d.message.as_str())
    }

    pub fn warning_messages(&self) -> impl Iterator<Item = &str> {
        self.warnings.iter().map(|d| d.message.as_str())
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
