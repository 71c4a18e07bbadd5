/*!
# Spreadsheet Column Filter

A small web service that lets a user upload a spreadsheet, pick some of its
columns, and download a new spreadsheet holding only those columns.

## Overview

The service has two steps, each a single HTTP request:

- **Ingest** (`POST /upload`): the uploaded workbook is stored in a temporary
  directory, its first sheet is parsed into a row-major grid, and the header
  row (row 0) is returned to the browser. The stored filename is remembered in
  the caller's session.
- **Filter & Export** (`POST /filter`): the stored workbook is parsed again,
  every row is projected onto the requested columns (matched by header name,
  in request order) and the result is returned as an `.xlsx` download with a
  single sheet named "Filtered Data".

Uploads are deleted after a successful export, or by a delayed cleanup five
minutes after upload, whichever comes first.

## Modules

- **grid**: Cell values and the row-major grid model
- **loader**: Reading the first sheet of a workbook (calamine)
- **filter**: Column resolution and projection
- **downloader**: XLSX export (rust_xlsxwriter) and download headers
- **session**: Session identifiers and the session store
- **storage**: Temporary upload directory and delayed cleanup
- **config**: Environment-driven server configuration
- **error**: HTTP error type and JSON error responses
- **app**: Routing, handlers and server startup

## REST API Endpoints

- `GET /` - Upload and filter form
- `POST /upload` - Multipart upload, field `file`; returns `{ "headers": [...] }`
- `POST /filter` - JSON `{ "columns": [...], "fileName": "..." }`; returns the workbook
- `GET /static/...` - Static assets for the form
*/

pub mod downloader;
pub mod filter;
pub mod grid;
pub mod loader;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;
#[cfg(feature = "web")]
pub mod error;
#[cfg(feature = "web")]
pub mod session;
#[cfg(feature = "web")]
pub mod storage;

pub use grid::{CellValue, Grid};
