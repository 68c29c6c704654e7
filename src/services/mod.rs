pub mod cache;
pub mod gemini_service;
pub mod paper_service;
pub mod pdf_service;
