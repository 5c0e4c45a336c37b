use std::io::{self, Write};

use anyhow::Result;
use gphoto_client::{Collection, Item};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn from_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

pub fn item(out: &mut dyn Write, format: Format, item: &Item) -> Result<()> {
    match format {
        Format::Json => json_line(out, item),
        Format::Text => {
            writeln!(out, "id:         {}", item.id)?;
            writeln!(out, "name:       {}", item.display_name)?;
            writeln!(out, "url:        {}", item.access_url)?;
            writeln!(out, "collection: {}", item.collection_id.as_deref().unwrap_or("-"))?;
            Ok(())
        }
    }
}

pub fn collections(out: &mut dyn Write, format: Format, collections: &[Collection]) -> Result<()> {
    match format {
        Format::Json => json_line(out, collections),
        Format::Text => {
            if collections.is_empty() {
                writeln!(out, "no collections")?;
            }
            for collection in collections {
                writeln!(out, "{}\t{}", collection.id, collection.name)?;
            }
            Ok(())
        }
    }
}

pub fn collection(out: &mut dyn Write, format: Format, collection: &Collection) -> Result<()> {
    match format {
        Format::Json => json_line(out, collection),
        Format::Text => {
            writeln!(out, "{}\t{}", collection.id, collection.name)?;
            Ok(())
        }
    }
}

pub fn done(out: &mut dyn Write, format: Format, message: &str) -> Result<()> {
    match format {
        Format::Json => json_line(out, &serde_json::json!({ "ok": true, "message": message })),
        Format::Text => {
            writeln!(out, "{message}")?;
            Ok(())
        }
    }
}

fn json_line<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Redraws one progress line on stderr.
pub fn progress(done: u64, total: u64) {
    let percent = if total == 0 { 100 } else { done.saturating_mul(100) / total };
    let mut err = io::stderr().lock();
    let _ = write!(err, "\r{done}/{total} bytes ({percent}%)");
    if done >= total {
        let _ = writeln!(err);
    }
    let _ = err.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn item_json_uses_camel_case_fields() {
        let mut item = Item::new("item-1", "cat.jpg", "https://lh3/item-1");
        item.collection_id = Some("AF1".into());
        let text = render(|out| super::item(out, Format::Json, &item));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["collectionId"], "AF1");
        assert_eq!(value["displayName"], "cat.jpg");
        assert_eq!(value["accessUrl"], "https://lh3/item-1");
    }

    #[test]
    fn collections_render_one_per_line() {
        let list = vec![
            Collection { id: "AF1".into(), name: "Trips".into() },
            Collection { id: "AF2".into(), name: "Pets".into() },
        ];
        assert_eq!(render(|out| collections(out, Format::Text, &list)), "AF1\tTrips\nAF2\tPets\n");
        assert_eq!(render(|out| collections(out, Format::Text, &[])), "no collections\n");
        let json = render(|out| collections(out, Format::Json, &list));
        assert!(json.starts_with(r#"[{"id":"AF1","name":"Trips"}"#));
    }
}
