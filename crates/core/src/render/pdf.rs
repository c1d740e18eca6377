//! Single-page PDFs built with lopdf.

use lopdf::{Document, Object, Stream, dictionary};
use thiserror::Error;

use super::context::DocumentContext;
use crate::signature::layout::SignatureLayout;
use crate::verification::DocumentType;
use crate::workflow::error::WorkflowError;
use crate::workflow::stage::StageConfig;
use crate::workflow::types::OfficerRole;

/// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN_LEFT: i64 = 60;

/// Rendering failures.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The document type is uploaded by applicants, not generated.
    #[error("{0} is not a generated document")]
    NotGenerated(DocumentType),

    /// A field the template needs is absent.
    #[error("missing {field} for {document}")]
    MissingField {
        /// Document being rendered.
        document: DocumentType,
        /// Name of the missing field.
        field: &'static str,
    },

    /// lopdf failed to serialise the document.
    #[error("PDF serialisation failed: {0}")]
    Pdf(String),
}

impl From<RenderError> for WorkflowError {
    fn from(err: RenderError) -> Self {
        Self::Rendering(err.to_string())
    }
}

/// Renders the recommendation form, payment challan and certificate.
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    layout: SignatureLayout,
}

impl PdfRenderer {
    /// Renderer drawing signature boxes where `layout` says.
    #[must_use]
    pub const fn new(layout: SignatureLayout) -> Self {
        Self { layout }
    }

    /// Signature placement used by this renderer.
    #[must_use]
    pub const fn layout(&self) -> &SignatureLayout {
        &self.layout
    }

    /// Renders `kind` for an application.
    ///
    /// # Errors
    ///
    /// * `NotGenerated` for applicant-uploaded document types
    /// * `MissingField` if the challan has no fee or order id
    /// * `Pdf` if serialisation fails
    pub fn render(&self, kind: DocumentType, ctx: &DocumentContext) -> Result<Vec<u8>, RenderError> {
        let lines = body_lines(kind, ctx)?;
        let mut content = String::new();

        content.push_str("BT\n/F2 16 Tf\n");
        content.push_str(&format!("{MARGIN_LEFT} {} Td\n", PAGE_HEIGHT - 80));
        content.push_str(&format!("({}) Tj\nET\n", escape(title(kind))));

        content.push_str("BT\n/F1 11 Tf\n16 TL\n");
        content.push_str(&format!("{MARGIN_LEFT} {} Td\n", PAGE_HEIGHT - 120));
        for line in &lines {
            content.push_str(&format!("({}) Tj T*\n", escape(line)));
        }
        content.push_str("ET\n");

        for role in signers(kind) {
            let at = self.layout.resolve(kind, role);
            content.push_str(&format!(
                "0.5 w\n{} {} {} {} re S\n",
                at.x, at.y, at.width, at.height
            ));
            content.push_str(&format!(
                "BT\n/F1 8 Tf\n{} {} Td\n({}) Tj\nET\n",
                at.x,
                at.y.saturating_sub(10),
                escape(role.title())
            ));
        }

        build_document(content)
    }
}

/// Roles whose stages sign `kind`, in stage order without repeats.
fn signers(kind: DocumentType) -> Vec<OfficerRole> {
    let mut roles = Vec::new();
    for config in StageConfig::table() {
        if config.signs == Some(kind)
            && let Some(role) = config.role
            && !roles.contains(&role)
        {
            roles.push(role);
        }
    }
    roles
}

const fn title(kind: DocumentType) -> &'static str {
    match kind {
        DocumentType::RecommendationForm => "RECOMMENDATION FOR REGISTRATION",
        DocumentType::PaymentChallan => "REGISTRATION FEE CHALLAN",
        _ => "CERTIFICATE OF REGISTRATION",
    }
}

fn body_lines(kind: DocumentType, ctx: &DocumentContext) -> Result<Vec<String>, RenderError> {
    let position = ctx.position.title();
    let date = ctx.issued_on.format("%d-%m-%Y").to_string();
    let mut lines = vec![
        format!("Application No: {}", ctx.application_number),
        format!("Applicant: {}", ctx.applicant_name),
        format!("Position: {position}"),
        format!("Date: {date}"),
        String::new(),
    ];

    match kind {
        DocumentType::RecommendationForm => {
            lines.push(
                "The documents submitted by the applicant have been examined and the"
                    .to_string(),
            );
            lines.push(format!("undersigned recommend registration as {position}."));
        }
        DocumentType::PaymentChallan => {
            let fee = ctx.fee.ok_or(RenderError::MissingField {
                document: kind,
                field: "fee",
            })?;
            let order_id = ctx.order_id.as_deref().ok_or(RenderError::MissingField {
                document: kind,
                field: "order id",
            })?;
            lines.push(format!("Registration fee: {fee}"));
            lines.push(format!("Order: {order_id}"));
            if let Some(reference) = &ctx.transaction_ref {
                lines.push(format!("Transaction: {reference}"));
            }
            lines.push("Received with thanks.".to_string());
        }
        DocumentType::Certificate => {
            lines.push(format!(
                "This is to certify that {} is registered as {position}",
                ctx.applicant_name
            ));
            lines.push("with the Building Permission Department.".to_string());
        }
        other => return Err(RenderError::NotGenerated(other)),
    }
    Ok(lines)
}

fn build_document(content: String) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
            "F2" => bold_id,
        },
    });
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        "Resources" => resources_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    Ok(buffer)
}

/// Escapes a PDF literal string; non-ASCII becomes `?`.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}
