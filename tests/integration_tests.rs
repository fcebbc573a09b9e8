use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

/// Helper function to run dealchart with arguments and optional stdin input
fn run_dealchart(args: &[&str], stdin: Option<&str>) -> Result<Vec<u8>, String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_dealchart"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if let Some(mut handle) = child.stdin.take() {
        if let Some(input) = stdin {
            handle
                .write_all(input.as_bytes())
                .map_err(|e| format!("Failed to write to stdin: {}", e))?;
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

/// Text content of every <text> element in an SVG document
fn svg_texts(svg: &str) -> Vec<String> {
    svg.split("<text")
        .skip(1)
        .filter_map(|chunk| {
            let start = chunk.find('>')? + 1;
            let end = chunk.find("</text>")?;
            Some(chunk[start..end].trim().to_string())
        })
        .collect()
}

fn render_svg_texts(args: &[&str], stdin: Option<&str>) -> Vec<String> {
    let result = run_dealchart(args, stdin);
    assert!(result.is_ok(), "Failed: {:?}", result.as_ref().err());
    let svg = String::from_utf8(result.unwrap()).expect("SVG is UTF-8");
    assert!(svg.contains("<svg"));
    svg_texts(&svg)
}

#[test]
fn test_end_to_end_single_series_png() {
    let result = run_dealchart(&["test/deals.csv"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()), "Output is not a valid PNG");
}

#[test]
fn test_end_to_end_stacked_svg() {
    let texts = render_svg_texts(
        &["test/deals.csv", "--category", "Region", "--format", "svg", "--title", "Deals"],
        None,
    );
    for label in ["North", "South", "East", "Number of Deals", "2015", "2021", "Deals"] {
        assert!(texts.iter().any(|t| t == label), "missing '{}'", label);
    }
    // bottom segment of 2015 is North's 120000
    assert!(texts.iter().any(|t| t == "£120k"));
}

#[test]
fn test_end_to_end_blank_category_is_unknown() {
    let texts = render_svg_texts(&["test/deals.csv", "--category", "Sector", "--format", "svg"], None);
    assert!(texts.iter().any(|t| t == "Unknown"));
}

#[test]
fn test_end_to_end_exclude_unknown_category() {
    let texts = render_svg_texts(
        &[
            "test/deals.csv",
            "--category",
            "Sector",
            "--filter",
            r#"exclude(column: "Sector", values: ["Unknown"])"#,
            "--format",
            "svg",
        ],
        None,
    );
    assert!(!texts.iter().any(|t| t == "Unknown"));
}

#[test]
fn test_end_to_end_stdin_and_years() {
    let csv = fs::read_to_string("test/deals.csv").expect("Failed to read test CSV");
    let texts = render_svg_texts(&["-", "--years", "2017..2019", "--format", "svg"], Some(&csv));
    assert!(texts.iter().any(|t| t == "2017"));
    assert!(texts.iter().any(|t| t == "2019"));
    assert!(!texts.iter().any(|t| t == "2016" || t == "2020"));
}

#[test]
fn test_end_to_end_filter_and_styles() {
    let texts = render_svg_texts(
        &[
            "test/deals.csv",
            "--category",
            "Region",
            "--filter",
            r#"exclude(column: "Region", values: ["East"])"#,
            "--style",
            r##"category(label: "South", color: "#000000", order: 0)"##,
            "--style",
            r#"category(label: "North", order: 1)"#,
            "--format",
            "svg",
        ],
        None,
    );
    assert!(!texts.iter().any(|t| t == "East"));
    let south = texts.iter().position(|t| t == "South").expect("South in legend");
    let north = texts.iter().position(|t| t == "North").expect("North in legend");
    assert!(south < north, "legend follows stack order");
}

#[test]
fn test_end_to_end_prediction_mode() {
    let texts = render_svg_texts(
        &["test/deals.csv", "--predict-from", "2020", "--format", "svg"],
        None,
    );
    assert!(texts.iter().any(|t| t == "Total Amount"));
    assert!(texts.iter().any(|t| t == "Total Amount (Predicted)"));
    assert!(texts.iter().any(|t| t == "Number of Deals (Predicted)"));
}

#[test]
fn test_end_to_end_legacy_headers_and_delimiter() {
    let result = run_dealchart(
        &["test/legacy_headers.csv", "--delimiter", ";", "--legacy-labels"],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_json_input_with_config() {
    let texts = render_svg_texts(&["test/deals.json", "--config", "test/config.json"], None);
    assert!(texts.iter().any(|t| t == "Deals by Region"));
    assert!(texts.iter().any(|t| t == "North"));
    assert!(texts.iter().any(|t| t == "£2.5k"));
}

#[test]
fn test_end_to_end_output_file() {
    let path = std::env::temp_dir().join("dealchart_integration_output.png");
    let _ = fs::remove_file(&path);
    let path_str = path.to_str().expect("temp path is UTF-8");

    let result = run_dealchart(&["test/deals.csv", "--output", path_str], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(result.unwrap().is_empty());

    let bytes = fs::read(&path).expect("output file written");
    assert!(is_valid_png(&bytes));
    let _ = fs::remove_file(&path);
}

#[test]
fn test_error_missing_column_names_both() {
    let result = run_dealchart(&["test/missing_column.csv"], None);
    let err = result.unwrap_err();
    assert!(err.contains("Amount"), "stderr: {}", err);
    assert!(err.contains("Deal Value"), "stderr: {}", err);
}

#[test]
fn test_error_empty_range() {
    let result = run_dealchart(&["test/deals.csv", "--start", "2001", "--end", "2003"], None);
    let err = result.unwrap_err();
    assert!(err.contains("No data in range 2001-2003"), "stderr: {}", err);
}

#[test]
fn test_error_bad_value() {
    let result = run_dealchart(&["test/bad_value.csv"], None);
    let err = result.unwrap_err();
    assert!(err.contains("lots"), "stderr: {}", err);
}

#[test]
fn test_error_unknown_category_column() {
    let result = run_dealchart(&["test/deals.csv", "--category", "Owner"], None);
    let err = result.unwrap_err();
    assert!(err.contains("Column 'Owner' not found"), "stderr: {}", err);
}

#[test]
fn test_error_bad_filter_expression() {
    let result = run_dealchart(&["test/deals.csv", "--filter", "only(North)"], None);
    assert!(result.is_err());
}

#[test]
fn test_error_nothing_to_draw() {
    let result = run_dealchart(&["test/deals.csv", "--no-bars", "--no-line"], None);
    let err = result.unwrap_err();
    assert!(err.contains("At least one"), "stderr: {}", err);
}

#[test]
fn test_error_reversed_years() {
    let result = run_dealchart(&["test/deals.csv", "--years", "2020..2015"], None);
    assert!(result.is_err());
}
