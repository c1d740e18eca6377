//! Where each officer's signature goes on a generated PDF.

use std::collections::HashMap;

use permitflow_shared::config::SignaturePlacement;
use serde::Serialize;

use crate::verification::DocumentType;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::OfficerRole;

/// Signature box in PDF points, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignatureCoordinates {
    /// 1-based page number.
    pub page: u32,
    /// Left edge.
    pub x: u32,
    /// Bottom edge.
    pub y: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl SignatureCoordinates {
    /// A box on page 1.
    #[must_use]
    pub const fn at(x: u32, y: u32) -> Self {
        Self {
            page: 1,
            x,
            y,
            width: 150,
            height: 50,
        }
    }
}

const FALLBACK: SignatureCoordinates = SignatureCoordinates::at(400, 60);

/// Lookup keyed by (document, role), falling back to the document-wide entry.
#[derive(Debug, Clone)]
pub struct SignatureLayout {
    by_role: HashMap<(DocumentType, OfficerRole), SignatureCoordinates>,
    by_document: HashMap<DocumentType, SignatureCoordinates>,
}

impl Default for SignatureLayout {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SignatureLayout {
    /// Layout matching the templates produced by the PDF renderer.
    ///
    /// The recommendation form stacks four signature boxes, one per role.
    #[must_use]
    pub fn with_defaults() -> Self {
        let by_role = HashMap::from([
            (
                (DocumentType::RecommendationForm, OfficerRole::JuniorEngineer),
                SignatureCoordinates::at(60, 200),
            ),
            (
                (DocumentType::RecommendationForm, OfficerRole::AssistantEngineer),
                SignatureCoordinates::at(330, 200),
            ),
            (
                (DocumentType::RecommendationForm, OfficerRole::ExecutiveEngineer),
                SignatureCoordinates::at(60, 90),
            ),
            (
                (DocumentType::RecommendationForm, OfficerRole::CityEngineer),
                SignatureCoordinates::at(330, 90),
            ),
            (
                (DocumentType::Certificate, OfficerRole::ExecutiveEngineer),
                SignatureCoordinates::at(60, 90),
            ),
            (
                (DocumentType::Certificate, OfficerRole::CityEngineer),
                SignatureCoordinates::at(330, 90),
            ),
        ]);
        let by_document = HashMap::from([
            (DocumentType::RecommendationForm, FALLBACK),
            (DocumentType::PaymentChallan, SignatureCoordinates::at(330, 120)),
            (DocumentType::Certificate, FALLBACK),
        ]);
        Self {
            by_role,
            by_document,
        }
    }

    /// Returns a copy with configured placements applied.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for unknown codes or a zero page.
    pub fn with_overrides(mut self, placements: &[SignaturePlacement]) -> Result<Self, WorkflowError> {
        for placement in placements {
            let document = DocumentType::parse(&placement.document).ok_or_else(|| {
                WorkflowError::Validation(format!("unknown document '{}'", placement.document))
            })?;
            if placement.page == 0 {
                return Err(WorkflowError::Validation(
                    "signature page numbers start at 1".to_string(),
                ));
            }
            let coordinates = SignatureCoordinates {
                page: placement.page,
                x: placement.x,
                y: placement.y,
                width: placement.width,
                height: placement.height,
            };
            match placement.role.as_deref() {
                Some(code) => {
                    let role = OfficerRole::parse(code).ok_or_else(|| {
                        WorkflowError::Validation(format!("unknown officer role '{code}'"))
                    })?;
                    self.by_role.insert((document, role), coordinates);
                }
                None => {
                    self.by_document.insert(document, coordinates);
                }
            }
        }
        Ok(self)
    }

    /// Coordinates for `role` signing `document`.
    #[must_use]
    pub fn resolve(&self, document: DocumentType, role: OfficerRole) -> SignatureCoordinates {
        self.by_role
            .get(&(document, role))
            .or_else(|| self.by_document.get(&document))
            .copied()
            .unwrap_or(FALLBACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_specific_then_document_fallback() {
        let layout = SignatureLayout::with_defaults();
        assert_eq!(
            layout.resolve(DocumentType::RecommendationForm, OfficerRole::AssistantEngineer),
            SignatureCoordinates::at(330, 200)
        );
        assert_eq!(
            layout.resolve(DocumentType::PaymentChallan, OfficerRole::Clerk),
            SignatureCoordinates::at(330, 120)
        );
        assert_eq!(
            layout.resolve(DocumentType::Photograph, OfficerRole::Clerk),
            FALLBACK
        );
    }

    #[test]
    fn test_overrides() {
        let layout = SignatureLayout::with_defaults()
            .with_overrides(&[
                SignaturePlacement {
                    document: "certificate".to_string(),
                    role: Some("city_engineer".to_string()),
                    page: 2,
                    x: 10,
                    y: 20,
                    width: 30,
                    height: 40,
                },
                SignaturePlacement {
                    document: "payment_challan".to_string(),
                    role: None,
                    page: 1,
                    x: 1,
                    y: 2,
                    width: 3,
                    height: 4,
                },
            ])
            .unwrap();

        let ce = layout.resolve(DocumentType::Certificate, OfficerRole::CityEngineer);
        assert_eq!((ce.page, ce.x, ce.y), (2, 10, 20));
        let challan = layout.resolve(DocumentType::PaymentChallan, OfficerRole::Clerk);
        assert_eq!((challan.x, challan.height), (1, 4));
    }

    #[test]
    fn test_bad_override() {
        let bad = SignaturePlacement {
            document: "certificate".to_string(),
            role: None,
            page: 0,
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        };
        assert!(SignatureLayout::with_defaults().with_overrides(&[bad]).is_err());
    }
}
