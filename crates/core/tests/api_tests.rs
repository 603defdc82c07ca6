//! Library API integration tests
use mp2md_core::*;
use std::fs;
use std::path::{Path, PathBuf};

fn get_fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn read_fixture(name: &str) -> String {
    fs::read_to_string(get_fixture_path(name)).unwrap()
}

/// Copies the captured article into `dir` along with its local image.
fn stage_article(dir: &Path, image: &[u8]) -> PathBuf {
    fs::create_dir_all(dir.join("images")).unwrap();
    fs::write(dir.join("images/diagram.png"), image).unwrap();
    let page = dir.join("index.html");
    fs::write(&page, read_fixture("wechat_article.html")).unwrap();
    page
}

fn article_page(title: &str, body: &str) -> String {
    format!(
        r#"<html><body><h1 id="activity-name">{}</h1><div id="js_content">{}</div></body></html>"#,
        title, body
    )
}

#[test]
fn test_parse_captured_article() {
    let article = parse_article(&read_fixture("wechat_article.html"), None).expect("should parse");
    assert_eq!(article.title_text(), "Rust 所有权入门");
    assert_eq!(article.title.attr("level"), "1");
    assert!(!article.content.is_empty());
}

#[test]
fn test_render_captured_article() {
    let article = parse_article(&read_fixture("wechat_article.html"), None).unwrap();
    let rendered = render_markdown(&article);
    let md = &rendered.markdown;

    assert!(md.starts_with("# Rust 所有权入门  \n"));
    assert!(md.contains("**最独特**"));
    assert!(md.contains("## 借用  \n"));
    assert!(md.contains("[the book](https://doc.rust-lang.org/book/)"));
    assert!(md.contains("*details*"));
    assert!(md.contains("> 引用必须总是有效的。"));
    assert!(md.contains("- 每个值都有一个所有者  \n- 同一时间只有一个所有者  \n"));
    assert!(md.contains("1. move  \n1. borrow  \n"));
    assert!(md.contains("```\nlet s = String::from(\"hi\");\nlet t = &s;\n```\n"));
    assert!(md.contains("![内存布局](images/diagram.png)"));
    assert!(md.contains("| 类型 | 位置 |\n| --- | --- |\n| String | 堆 |\n"));
    assert!(!md.contains("ignored"));
    assert!(rendered.images.is_empty());
}

#[test]
fn test_extract_text_captured_article() {
    let article = parse_article(&read_fixture("wechat_article.html"), None).unwrap();
    let text = extract_text(&article);

    assert!(text.starts_with("Rust 所有权入门\n\n"));
    assert!(text.contains("最独特"));
    assert!(text.contains("借用\n\n"));
    assert!(text.contains("the book"));
    assert!(text.contains("let t = &s;\n"));
    assert!(!text.contains("**"));
    assert!(!text.contains("https://doc.rust-lang.org"));
    assert!(!text.contains("diagram.png"));
}

#[test]
fn test_parse_generic_page_falls_back() {
    let article = parse_article(&read_fixture("plain_article.html"), None).unwrap();
    assert_eq!(article.title_text(), "Plain Page");

    let md = render_markdown(&article).markdown;
    assert!(md.starts_with("# Plain Page  \nFirst paragraph."));
    assert!(md.contains("Second **bold** paragraph."));
}

#[test]
fn test_parse_resolves_against_base_url() {
    let base = url::Url::parse("https://mp.example.com/s/abc").unwrap();
    let html = article_page("T", r#"<img src="/img/a.jpg"><a href="next">next</a>"#);
    let article = parse_article(&html, Some(&base)).unwrap();

    assert_eq!(article.content[0].attr("src"), "https://mp.example.com/img/a.jpg");
    assert_eq!(article.content[1].attr("href"), "https://mp.example.com/s/next");
}

#[test]
fn test_save_policy_images_are_deduplicated() {
    let png = b"\x89PNG same bytes".to_vec();
    let article = Article::new(
        Piece::header(1, "Images"),
        vec![
            Piece::image_bytes("https://cdn.example.com/a.png?x=1", "", png.clone()),
            Piece::block_quote(vec![Piece::image_bytes("https://cdn.example.com/b.png", "b", png.clone())]),
            Piece::image_bytes("https://cdn.example.com/c.jpg", "c", b"other".to_vec()),
        ],
    );

    let rendered = render_markdown(&article);
    assert_eq!(rendered.images.len(), 2);

    let shared = image_file_name("a.png", &png);
    assert_eq!(shared, image_file_name("b.png", &png));
    assert_eq!(rendered.images.get(&shared), Some(&png));
    assert!(rendered.markdown.contains(&format!("![{shared}](./{shared})")));
    assert!(rendered.markdown.contains(&format!("> ![b](./{shared})")));
    assert_ne!(image_file_name("c.jpg", b"other"), shared);
}

#[test]
fn test_convert_file_to_text_api() {
    let dir = tempfile::tempdir().unwrap();
    let written = convert_file_to_text(&get_fixture_path("plain_article.html"), dir.path()).unwrap();

    assert_eq!(written, dir.path().join("Plain Page.txt"));
    let text = fs::read_to_string(written).unwrap();
    assert!(text.starts_with("Plain Page\n\nFirst paragraph."));
}

#[tokio::test]
async fn test_parse_from_file_url_policy() {
    let dir = tempfile::tempdir().unwrap();
    let page = stage_article(dir.path(), b"diagram");

    let config = ConvertConfig::builder().image_policy(ImagePolicy::Url).build();
    let article = parse_from_file(&page, &config).await.unwrap();
    assert_eq!(article, read_article(&page).unwrap());
}

#[tokio::test]
async fn test_convert_file_save_policy() {
    let dir = tempfile::tempdir().unwrap();
    let page = stage_article(dir.path(), b"diagram bytes");

    let config = ConvertConfig::builder().image_policy(ImagePolicy::Save).build();
    let written = convert_file_to_markdown(&page, dir.path(), &config).await.unwrap();
    assert_eq!(written, dir.path().join("Rust 所有权入门.md"));

    let name = image_file_name("images/diagram.png", b"diagram bytes");
    assert!(name.ends_with(".png"));
    assert_eq!(fs::read(dir.path().join(&name)).unwrap(), b"diagram bytes");

    let md = fs::read_to_string(written).unwrap();
    assert!(md.contains(&format!("![内存布局](./{name})")));
}

#[tokio::test]
async fn test_convert_file_base64_policy() {
    let dir = tempfile::tempdir().unwrap();
    let page = stage_article(dir.path(), b"hi");
    let out = dir.path().join("article.md");

    let config = ConvertConfig::builder().image_policy(ImagePolicy::Base64).build();
    let written = convert_file_to_markdown(&page, &out, &config).await.unwrap();
    assert_eq!(written, out);

    let md = fs::read_to_string(out).unwrap();
    assert!(md.contains("![内存布局][0]"));
    assert!(md.ends_with("\n[0]:data:image/png;base64,aGk="));
}

#[tokio::test]
async fn test_batch_convert_three_articles() {
    let base = tempfile::tempdir().unwrap();
    for (dir, title) in [("a", "First"), ("b", "Second"), ("c", "Third")] {
        let dir = base.path().join(dir);
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("index.html"), article_page(title, "<p>body</p>")).unwrap();
    }
    let empty = base.path().join("d");
    fs::create_dir(&empty).unwrap();
    fs::write(empty.join("notes.txt"), "not html").unwrap();

    let config = ConvertConfig::builder().image_policy(ImagePolicy::Url).build();
    let converted = batch_convert(base.path(), &config).await.unwrap();
    assert_eq!(converted, 3);

    for (dir, title) in [("a", "First"), ("b", "Second"), ("c", "Third")] {
        let md = fs::read_to_string(base.path().join(dir).join(format!("{title}.md"))).unwrap();
        assert_eq!(md, format!("# {title}  \nbody"));
    }
    assert_eq!(fs::read_dir(&empty).unwrap().count(), 1);
}

#[tokio::test]
async fn test_batch_convert_saves_images_per_article() {
    let base = tempfile::tempdir().unwrap();
    let dir = base.path().join("2024-01-01 article");
    stage_article(&dir, b"local image");

    let config = ConvertConfig::builder().image_policy(ImagePolicy::Save).build();
    assert_eq!(batch_convert(base.path(), &config).await.unwrap(), 1);

    let name = image_file_name("diagram.png", b"local image");
    assert!(dir.join(name).is_file());
    assert!(dir.join("Rust 所有权入门.md").is_file());
}

#[tokio::test]
async fn test_batch_convert_missing_base() {
    let base = tempfile::tempdir().unwrap();
    let result = batch_convert(&base.path().join("missing"), &ConvertConfig::default()).await;
    assert!(matches!(result, Err(Mp2mdError::PathAccess { .. })));
}

#[test]
fn test_batch_convert_to_text_prefers_index() {
    let base = tempfile::tempdir().unwrap();
    let dir = base.path().join("one");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("a.htm"), article_page("Other", "<p>other</p>")).unwrap();
    fs::write(dir.join("index.html"), article_page("Index", "<p>index</p>")).unwrap();

    assert_eq!(batch_convert_to_text(base.path()).unwrap(), 1);
    assert_eq!(fs::read_to_string(dir.join("Index.txt")).unwrap(), "Index\n\nindex");
    assert!(!dir.join("Other.txt").exists());
}

#[test]
fn test_rename_directories_api() {
    let base = tempfile::tempdir().unwrap();
    fs::create_dir(base.path().join("2023-05-01 \"测试 文章\"")).unwrap();
    fs::create_dir(base.path().join("no-date-here")).unwrap();

    assert_eq!(rename_directories(base.path()).unwrap(), 1);
    assert!(base.path().join("2023-05-01测试文章").is_dir());
    assert!(base.path().join("no-date-here").is_dir());
}
