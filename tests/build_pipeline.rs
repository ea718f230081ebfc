//! End-to-end pipeline tests: CSV on disk → records → both serializers.

use cast_cards::castlist::read_castlist;
use cast_cards::pipeline::{BuildOptions, CastlistBuilder, DEFAULT_PORTRAIT};
use cast_cards::portrait::{DetectorError, Region, SubjectDetector};
use cast_cards::{cards, players};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageEncoder, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Detector reporting one fixed box, regardless of input.
struct FixedBoxDetector(Region);

impl SubjectDetector for FixedBoxDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Region>, DetectorError> {
        Ok(vec![self.0])
    }
}

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 251) as u8, (y % 241) as u8, 77])
    });
    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new(&mut buffer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    std::fs::write(path, buffer.into_inner()).unwrap();
}

fn options() -> BuildOptions {
    BuildOptions {
        fetch_timeout: Duration::from_secs(2),
        ..BuildOptions::default()
    }
}

/// Fixture: a cast list with a local portrait, a name-only row, a row with
/// an unreachable remote portrait, and a structurally empty row.
fn fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_jpeg(&tmp.path().join("alice.jpg"), 1600, 1200);
    std::fs::write(
        tmp.path().join("castlist.csv"),
        "Real Name,Character,Comments,Image,Crop,Resize,Channel\n\
         Alice Example,Hamlet,understudy Tue,alice.jpg,1,1,12\n\
         Bob Only,,,,0,0,\n\
         ,Ophelia,,http://127.0.0.1:1/missing.jpg,0,0,3\n\
         ,,,,,,\n",
    )
    .unwrap();
    tmp
}

#[test]
fn three_row_build_end_to_end() {
    let tmp = fixture();
    let entries = read_castlist(&tmp.path().join("castlist.csv"), false).unwrap();
    // The structurally empty row is gone already.
    assert_eq!(entries.len(), 3);

    // On a 1600x1200 source: box 400x300 → padded to 800x600 → resized to
    // 512x384.
    let detector = FixedBoxDetector(Region {
        top: 300,
        right: 800,
        bottom: 600,
        left: 400,
    });
    let builder = CastlistBuilder::new(&detector, options());
    let records = builder.build(&entries, tmp.path()).unwrap();

    assert_eq!(records.len(), 3);

    // Row 1: real portrait, cropped and bounded.
    let alice = &records[0];
    assert_eq!(alice.name, "Alice Example");
    assert_eq!(alice.role_name, "Hamlet");
    assert_ne!(alice.image, DEFAULT_PORTRAIT);
    let img = image::load_from_memory(&alice.image).unwrap();
    assert_eq!((img.width(), img.height()), (512, 384));

    // Row 2: no image reference → the bundled default, byte for byte.
    assert_eq!(records[1].image, DEFAULT_PORTRAIT);

    // Row 3: unreachable URL → same fallback.
    assert_eq!(records[2].image, DEFAULT_PORTRAIT);

    // Constant schema fields on every record.
    for record in &records {
        assert!(!record.compressed);
        assert!(!record.scaled);
        assert_eq!(record.version, 1);
        assert!(!record.image.is_empty());
    }
}

#[test]
fn serializers_see_records_in_builder_order() {
    let tmp = fixture();
    let entries = read_castlist(&tmp.path().join("castlist.csv"), false).unwrap();
    let detector = FixedBoxDetector(Region {
        top: 300,
        right: 800,
        bottom: 600,
        left: 400,
    });
    let builder = CastlistBuilder::new(&detector, options());
    let records = builder.build(&entries, tmp.path()).unwrap();

    // Player list: same names, same order.
    let mut buffer = Vec::new();
    players::write_players(&records, &mut buffer).unwrap();
    let value = plist_names(&buffer);
    assert_eq!(value, vec!["Alice Example", "Bob Only", ""]);

    // Card document: one page per record.
    let mut pdf = Vec::new();
    cards::render_cards(&records, &mut pdf).unwrap();
    let doc = lopdf::Document::load_mem(&pdf).unwrap();
    assert_eq!(doc.get_pages().len(), records.len());
}

fn plist_names(buffer: &[u8]) -> Vec<String> {
    let value = plist::Value::from_reader(Cursor::new(buffer)).unwrap();
    let plist::Value::Array(items) = value else {
        panic!("expected array root");
    };
    items
        .iter()
        .map(|item| {
            let plist::Value::Dictionary(dict) = item else {
                panic!("expected dictionary record");
            };
            match dict.get("Name") {
                Some(plist::Value::String(name)) => name.clone(),
                other => panic!("missing Name field: {other:?}"),
            }
        })
        .collect()
}

#[test]
fn resize_default_flag_applies_to_rows_without_resize_cell() {
    let tmp = TempDir::new().unwrap();
    write_jpeg(&tmp.path().join("big.jpg"), 2000, 1000);
    std::fs::write(
        tmp.path().join("castlist.csv"),
        "Real Name,Character,Image,Crop\nAlice,Hamlet,big.jpg,0\n",
    )
    .unwrap();

    let entries = read_castlist(&tmp.path().join("castlist.csv"), true).unwrap();
    assert!(entries[0].resize);

    let detector = FixedBoxDetector(Region {
        top: 0,
        right: 10,
        bottom: 10,
        left: 0,
    });
    let builder = CastlistBuilder::new(&detector, options());
    let records = builder.build(&entries, tmp.path()).unwrap();

    let img = image::load_from_memory(&records[0].image).unwrap();
    assert_eq!((img.width(), img.height()), (512, 256));
}
