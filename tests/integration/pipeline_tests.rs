//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to serve a small catalog and run the full
//! pipeline end-to-end with the HTML parser and the HTTP image codec.

use catalog_harvest::config::{parse_config, Config};
use catalog_harvest::crawler::Pipeline;
use catalog_harvest::progress::NoopObserver;
use catalog_harvest::{ArchiveStatus, ImageStatus};
use image::GenericImageView;
use std::fs::File;
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing under `output_root`
fn create_test_config(output_root: &str) -> Config {
    parse_config(&format!(
        r#"
[crawler]
max-workers = 4
page-workers = 4
page-batch-size = 2
max-retries = 3
backoff-schedule-ms = [5]
request-timeout-secs = 5
connect-timeout-secs = 2

[user-agent]
crawler-name = "TestHarvest"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
output-root = "{}"
image-format = "png"

[site]
category-patterns = ["/category/"]
product-patterns = ["/product/"]
product-link-selector = "a.product-link"
pagination-selector = ".pagination a"
name-selector = "h1"
code-selector = ".sku"
price-selector = ".price"
spec-selector = "table.specs"
image-selector = "img.main"
series-selector = ".series"
spec-footer = [["Warranty", "12 months"]]
"#,
        output_root.replace('\\', "/")
    ))
    .expect("test config is valid")
}

fn png_bytes() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 30, 30]));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

fn listing(products: &[&str]) -> ResponseTemplate {
    let links: String = products
        .iter()
        .map(|p| format!(r#"<a class="product-link" href="/product/{}">{}</a>"#, p, p))
        .collect();
    html(format!(
        r#"{}<div class="pagination"><a href="?page=1">1</a><a href="?page=2">2</a><a href="?page=2">Next</a></div>"#,
        links
    ))
}

fn product_page(code: &str, price: Option<&str>, series: Option<&str>) -> ResponseTemplate {
    html(format!(
        r#"<h1>Sensor {code}</h1>
        <span class="sku">Code: {code}</span>
        {price}
        {series}
        <img class="main" src="/img/{code}.png">
        <table class="specs"><tr><td>Range</td><td>10 m [...]</td></tr></table>"#,
        code = code,
        price = price
            .map(|p| format!(r#"<span class="price">{}</span>"#, p))
            .unwrap_or_default(),
        series = series
            .map(|s| format!(r#"<span class="series">{}</span>"#, s))
            .unwrap_or_default(),
    ))
}

async fn mount_catalog(server: &MockServer) {
    let png = png_bytes();

    // Page 2 first so it wins over the bare path matcher
    Mock::given(method("GET"))
        .and(path("/category/sensors_5"))
        .and(query_param("page", "2"))
        .respond_with(listing(&["e3z-t61_102", "e2e-x5_103"]))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/category/sensors_5"))
        .respond_with(listing(&["e3z-d61_101", "e3z-t61_102"]))
        .mount(server)
        .await;

    for (slug, code, price, series) in [
        ("e3z-d61_101", "E3Z-D61", Some("1.200.000 đ"), Some("E3Z")),
        ("e3z-t61_102", "E3Z-T61", None, Some("E3Z")),
        ("e2e-x5_103", "E2E-X5", Some("800.000 đ"), None),
        ("g2r-1_200", "G2R-1", Some("95.000 đ"), Some("G2R")),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/product/{}", slug)))
            .respond_with(product_page(code, price, series))
            .mount(server)
            .await;
    }

    for code in ["E3Z-D61", "E3Z-T61", "G2R-1"] {
        Mock::given(method("GET"))
            .and(path(format!("/img/{}.png", code)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(png.clone())
                    .insert_header("content-type", "image/png"),
            )
            .mount(server)
            .await;
    }

    // Always missing: exactly max-retries attempts
    Mock::given(method("GET"))
        .and(path("/img/E2E-X5.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_against_mock_catalog() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let base = server.uri();

    let out = TempDir::new().unwrap();
    let config = create_test_config(&out.path().display().to_string());
    let run_dir = out.path().join("run_integration");

    let pipeline = Pipeline::from_config(config, Arc::new(NoopObserver))
        .unwrap()
        .with_run_dir(&run_dir);

    let seeds = vec![
        format!("{}/category/sensors_5", base),
        format!("{}/product/g2r-1_200", base),
        format!("{}/about", base),
    ];
    let report = pipeline.run(&seeds).await.unwrap();

    let t = &report.totals;
    assert_eq!(t.urls_processed, 3);
    assert_eq!(t.invalid_urls, 1);
    assert_eq!(t.categories, 1);
    assert_eq!(t.single_products, 1);
    assert_eq!(t.pages_discovered, 2);
    assert_eq!(t.products_found, 4);
    assert_eq!(t.products_processed, 4);
    assert_eq!(t.products_unpriced, 1);
    assert_eq!(t.images_success, 3);
    assert_eq!(t.images_failed, 1);
    assert_eq!(t.images_total(), 4);

    // Series rows add up to the records
    let series_total: usize = report.series.iter().map(|s| s.products).sum();
    assert_eq!(series_total, 4);
    assert!(report
        .series
        .iter()
        .any(|s| s.category == "sensors" && s.series == "Unknown" && s.products == 1));

    let category = run_dir.join("sensors");
    let image = category.join("E3Z").join("images").join("E3Z-D61.png");
    let decoded = image::open(&image).unwrap();
    assert_eq!(decoded.width(), 4);
    assert!(!category
        .join("Unknown")
        .join("images")
        .join("E2E-X5.png")
        .exists());

    assert!(category.join("E3Z_data.xlsx").is_file());
    assert!(category.join("Unknown_data.xlsx").is_file());
    assert!(category.join("data.xlsx").is_file());
    let urls = std::fs::read_to_string(category.join("product_urls.txt")).unwrap();
    assert_eq!(urls.lines().count(), 3);
    assert!(run_dir.join("single_products").join("G2R_data.xlsx").is_file());
    assert!(run_dir.join("summary.xlsx").is_file());

    let archive_path = out.path().join("run_integration.zip");
    assert_eq!(report.archive, ArchiveStatus::Created(archive_path.clone()));
    let mut zip = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
    assert!(zip.by_name("run_integration/summary.xlsx").is_ok());
    assert!(zip
        .by_name("run_integration/sensors/E3Z/images/E3Z-D61.png")
        .is_ok());
}

#[tokio::test]
async fn test_rerun_skips_existing_images() {
    let server = MockServer::start().await;
    let png = png_bytes();

    Mock::given(method("GET"))
        .and(path("/product/g2r-1_200"))
        .respond_with(product_page("G2R-1", Some("95.000 đ"), Some("G2R")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/G2R-1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png))
        .expect(1)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let run_dir = out.path().join("run_repeat");
    let seeds = vec![format!("{}/product/g2r-1_200", server.uri())];

    for expected in [ImageStatus::Success, ImageStatus::AlreadyExists] {
        let config = create_test_config(&out.path().display().to_string());
        let report = Pipeline::from_config(config, Arc::new(NoopObserver))
            .unwrap()
            .with_run_dir(&run_dir)
            .run(&seeds)
            .await
            .unwrap();

        match expected {
            ImageStatus::Success => assert_eq!(report.totals.images_success, 1),
            _ => assert_eq!(report.totals.images_existing, 1),
        }
    }
}

#[tokio::test]
async fn test_unreachable_category_still_completes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let config = create_test_config(&out.path().display().to_string());
    let report = Pipeline::from_config(config, Arc::new(NoopObserver))
        .unwrap()
        .with_run_dir(out.path().join("run_down"))
        .run(&[format!("{}/category/relays", server.uri())])
        .await
        .unwrap();

    assert_eq!(report.totals.categories, 1);
    assert_eq!(report.totals.products_found, 0);
    assert_eq!(report.totals.pages_failed, 1);
    assert!(report.failures >= 2);
    assert!(report.summary_path.is_some());
    assert!(!report.packaging_failed());
}
