//! OCR and text extraction module.
//!
//! Extracts page text from PDFs using:
//! - pdftotext (Poppler) and pdf-extract for documents with a text layer
//! - Tesseract OCR for scanned documents, rasterized with pdftoppm
//!
//! Both halves sit behind traits ([`NativeMethod`], [`OcrEngine`],
//! [`PdfInfoSource`]) so the pipeline can run against fakes in tests.

mod backend;
mod document;
mod extractor;
mod pdf_utils;
mod tesseract;
#[cfg(test)]
pub(crate) mod test_pdf;
mod tools;

pub use backend::{OcrEngine, OcrError, PageRecognition};
pub use document::{extract_ocr, OcrExtraction};
pub use extractor::{
    fit_page_count, select_longest, ExtractionError, NativeExtraction, NativeExtractor,
    NativeMethod, PdfExtractStream, PdfToTextLayout,
};
pub use pdf_utils::{parse_pdfinfo, FallbackInfo, PdfInfo, PdfInfoSource, Pdfinfo};
pub use tesseract::{installed_languages, parse_tsv, TesseractBackend};
pub use tools::{check_binary, check_tools, REQUIRED_TOOLS};
