use synced_lyrics_rs::converter::{
    self,
    generators::lrc_generator::generate_lrc,
    parsers::lrc_parser::parse_lrc,
    types::{LyricDocument, LyricLine},
};

use std::path::Path;

fn load_test_data(filename: &str) -> String {
    let path = Path::new("tests/test_data").join(filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("读取测试文件 '{:?}' 失败: {}", path, e))
}

fn pairs(doc: &LyricDocument) -> Vec<(f64, String)> {
    doc.lines()
        .iter()
        .map(|l| (l.start_time, l.text.clone()))
        .collect()
}

fn text_at(doc: &LyricDocument, time: f64) -> Option<&str> {
    doc.current_line(time).map(|l| l.text.as_str())
}

#[test]
fn test_parse_basic_file() {
    let doc = parse_lrc(&load_test_data("basic.lrc"));

    assert_eq!(doc.len(), 5, "应该解析五行歌词（包括空行）");
    assert_eq!(doc.metadata("ti"), Some("I Want to Live"));
    assert_eq!(doc.metadata("ar"), Some("Borislav Slavov"));
    assert_eq!(doc.metadata("length"), Some("03:53"), "值中的冒号应被保留");
    assert_eq!(doc.lines()[3].text, "", "只有时间戳的行应保留为空行");

    assert_eq!(doc.lines()[0].end_time, Some(11.0));
    assert_eq!(doc.lines()[2].end_time, Some(24.0));
    assert_eq!(doc.lines()[4].end_time, None, "最后一行没有结束时间");
}

#[test]
fn test_timeline_over_basic_file() {
    let doc = parse_lrc(&load_test_data("basic.lrc"));

    assert_eq!(text_at(&doc, 0.0), None, "第一行之前没有当前行");
    assert_eq!(text_at(&doc, 5.2), Some("First line"));
    assert_eq!(text_at(&doc, 10.999), Some("First line"));
    assert_eq!(text_at(&doc, 11.0), Some("Second line"));
    assert_eq!(text_at(&doc, 25.0), Some(""), "间奏时当前行是空行");
    assert_eq!(text_at(&doc, 31.0), Some("After an instrumental gap"));
    assert_eq!(text_at(&doc, 34.0), None, "最后一行按默认时长结束");

    assert_eq!(
        doc.next_line(12.0).map(|l| l.text.as_str()),
        Some("Third line")
    );
    assert_eq!(
        doc.previous_line(12.0).map(|l| l.text.as_str()),
        Some("First line")
    );
}

#[test]
fn test_multi_timestamp_lines_are_expanded_and_sorted() {
    let doc = parse_lrc(&load_test_data("multi_timestamp.lrc"));

    let expected: Vec<(f64, String)> = [
        (10.0, "Verse one"),
        (20.0, "Chorus"),
        (30.0, "Verse two"),
        (50.0, "Bridge"),
        (60.0, "Bridge"),
        (80.0, "Chorus"),
        (90.0, "Outro"),
    ]
    .into_iter()
    .map(|(t, s)| (t, s.to_string()))
    .collect();
    assert_eq!(pairs(&doc), expected);

    assert_eq!(text_at(&doc, 85.0), Some("Chorus"));
    assert_eq!(text_at(&doc, 55.0), Some("Bridge"));
}

#[test]
fn test_messy_file_is_tolerated() {
    let doc = parse_lrc(&load_test_data("messy.lrc"));

    assert_eq!(doc.metadata("ti"), Some("Messy"), "BOM 应被去除");
    assert_eq!(
        pairs(&doc),
        vec![
            (1.0, "ok".to_string()),
            (2.0, "[bad]not a second tag".to_string()),
            (3.5, "short fraction".to_string()),
        ],
        "不合法的时间戳、注释和无标签的行应被跳过"
    );
}

#[test]
fn test_empty_and_tagless_input() {
    assert!(parse_lrc("").is_empty());
    assert!(parse_lrc("just some words\nand more").is_empty());

    let metadata_only = parse_lrc("[ti:Nothing]\n[ar:Nobody]");
    assert!(metadata_only.is_empty());
    assert_eq!(metadata_only.metadata.len(), 2);
}

#[test]
fn test_file_round_trip_is_stable() {
    let original = parse_lrc(&load_test_data("multi_timestamp.lrc"));

    let first = generate_lrc(&original).unwrap();
    let reparsed = parse_lrc(&first);
    let second = generate_lrc(&reparsed).unwrap();

    assert_eq!(pairs(&original), pairs(&reparsed));
    assert_eq!(original.metadata, reparsed.metadata);
    assert_eq!(first, second, "第二次序列化的结果应与第一次相同");
    assert!(first.contains("[01:20.000]Chorus"));
}

#[test]
fn test_facade_functions() {
    let doc = LyricDocument::new(
        vec![LyricLine::new(2.0, "b"), LyricLine::new(1.0, "a")],
        Default::default(),
    );
    assert_eq!(doc.lines()[0].text, "a", "构造时应按开始时间排序");

    let text = converter::serialize(&doc).unwrap();
    assert_eq!(text, "[00:01.000]a\n[00:02.000]b\n");
    assert_eq!(pairs(&converter::parse(&text)), pairs(&doc));
}
