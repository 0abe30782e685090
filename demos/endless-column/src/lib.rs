use wasm_bindgen::prelude::*;

mod page;
use page::EndlessColumn;

column_web::export_page!(EndlessColumn, "endless-column");
