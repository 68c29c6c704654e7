use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    dto::paper_dto::{GeneratePaperPayload, GeneratePdfPayload, PaperResponse},
    error::{Error, Result},
    services::paper_service::PaperKey,
    AppState,
};

/// Structured endpoint: returns the question list as JSON.
pub async fn generate_paper(
    State(state): State<AppState>,
    Json(payload): Json<GeneratePaperPayload>,
) -> Result<Json<PaperResponse>> {
    payload.validate().map_err(|_| {
        Error::BadRequest("Missing required fields or invalid number of questions".to_string())
    })?;

    let key = PaperKey {
        subject: payload.subject.trim().to_string(),
        subtopic: payload.subtopic.trim().to_string(),
        level: payload.level.trim().to_string(),
        num_questions: payload.num_questions,
    };
    let questions = state.paper_service.generate_questions(&key).await?;

    Ok(Json(PaperResponse {
        organization: payload.organization.trim().to_string(),
        subject: key.subject,
        subtopic: key.subtopic,
        level: key.level,
        total_questions: questions.len(),
        questions: questions.as_ref().clone(),
    }))
}

/// Document endpoint: returns the generated paper as a PDF attachment.
pub async fn generate_paper_pdf(
    State(state): State<AppState>,
    Json(payload): Json<GeneratePdfPayload>,
) -> Result<impl IntoResponse> {
    let subject = payload.subject.filter(|s| !s.is_empty());
    let level = payload.level.filter(|s| !s.is_empty());
    let organization = payload.organization.filter(|s| !s.is_empty());
    let num_questions = payload.num_questions.filter(|n| *n > 0);

    let (Some(subject), Some(level), Some(num_questions), Some(organization)) =
        (subject, level, num_questions, organization)
    else {
        return Err(Error::BadRequest("Missing required fields".to_string()));
    };

    let text = state
        .paper_service
        .generate_document_text(&subject, &level, num_questions)
        .await?;
    let bytes = state
        .pdf_service
        .render_paper(&organization, &subject, &level, &text)?;

    let disposition = format!("attachment; filename=\"{}_Question_Paper.pdf\"", subject);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
