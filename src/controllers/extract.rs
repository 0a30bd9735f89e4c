use axum::{
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    Json,
};
use std::collections::HashMap;

use crate::{domain::media::UploadFile, error::AppError, error::AppResult};

/// Unwrap a JSON body, keeping rejections in the JSON error format
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Text fields and files of a multipart form. Only the first file per field is kept.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadFile>,
}

impl FormData {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadFile> {
        self.files.remove(name)
    }
}

pub async fn read_form(payload: Result<Multipart, MultipartRejection>) -> AppResult<FormData> {
    let mut multipart =
        payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let mut form = FormData::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.files.entry(name).or_insert(UploadFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            None => {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Uploaded file is too large".to_string())
    } else {
        AppError::BadRequest(err.body_text())
    }
}
