//! The `mathquiz init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create mathquiz.toml
    if std::path::Path::new("mathquiz.toml").exists() {
        println!("mathquiz.toml already exists, skipping.");
    } else {
        std::fs::write("mathquiz.toml", SAMPLE_CONFIG)?;
        println!("Created mathquiz.toml");
    }

    // Create sample question set
    std::fs::create_dir_all("questions")?;
    let sample_path = std::path::Path::new("questions/sample.json");
    if sample_path.exists() {
        println!("questions/sample.json already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_QUESTIONS)?;
        println!("Created questions/sample.json");
    }

    println!("\nNext steps:");
    println!("  1. Set GEMINI_API_KEY, or switch [generator] to the file generator");
    println!("  2. Run: mathquiz lessons");
    println!("  3. Run: mathquiz take --lesson l1.1");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# mathquiz configuration

subject = "Toán Lớp 6 - Kết nối tri thức"
progress_path = "math6_kntt_progress.json"
assessment_duration_secs = 3600
max_retries = 3
retry_delay_ms = 1000

[generator]
type = "gemini"
api_key = "${GEMINI_API_KEY}"
model = "gemini-2.5-flash"

# Offline: serve the same question set for every lesson.
# [generator]
# type = "file"
# path = "questions/sample.json"

# [report]
# type = "emailjs"
# service_id = "${EMAILJS_SERVICE_ID}"
# template_id = "${EMAILJS_TEMPLATE_ID}"
# public_key = "${EMAILJS_PUBLIC_KEY}"

[student]
student_name = ""
class_name = ""
school_name = ""
"#;

const SAMPLE_QUESTIONS: &str = r#"{
  "topic": "Bài 1: Tập hợp",
  "part1": [
    { "id": 1, "question": "Cho A = {0; 1; 2; 3}. Phần tử nào thuộc A?", "options": ["5", "3", "7", "9"], "correctAnswerIndex": 1, "explanation": "3 là một phần tử của A." },
    { "id": 2, "question": "Tập hợp các số tự nhiên nhỏ hơn 4 là:", "options": ["{1; 2; 3}", "{0; 1; 2; 3}", "{0; 1; 2; 3; 4}", "{1; 2; 3; 4}"], "correctAnswerIndex": 1, "explanation": "Số tự nhiên bắt đầu từ 0." },
    { "id": 3, "question": "Số phần tử của tập hợp B = {a; b; c; d} là:", "options": ["3", "4", "5", "2"], "correctAnswerIndex": 1 },
    { "id": 4, "question": "Cách viết nào đúng?", "options": ["0 ∈ ℕ*", "0 ∉ ℕ", "0 ∈ ℕ", "1 ∉ ℕ"], "correctAnswerIndex": 2, "explanation": "ℕ chứa số 0, ℕ* thì không." },
    { "id": 5, "question": "Số liền sau của 99 là:", "options": ["98", "100", "101", "909"], "correctAnswerIndex": 1 },
    { "id": 6, "question": "Số liền trước của 1000 là:", "options": ["999", "1001", "990", "100"], "correctAnswerIndex": 0 },
    { "id": 7, "question": "Giá trị của chữ số 5 trong số 3 572 là:", "options": ["5", "50", "500", "5000"], "correctAnswerIndex": 2, "explanation": "Chữ số 5 ở hàng trăm." },
    { "id": 8, "question": "Số La Mã XIV có giá trị là:", "options": ["16", "14", "9", "4"], "correctAnswerIndex": 1 },
    { "id": 9, "question": "Tập hợp C = {x ∈ ℕ | 2 < x < 6} có bao nhiêu phần tử?", "options": ["2", "3", "4", "5"], "correctAnswerIndex": 1, "explanation": "C = {3; 4; 5}." },
    { "id": 10, "question": "Số tự nhiên nhỏ nhất là:", "options": ["1", "0", "10", "Không có"], "correctAnswerIndex": 1 },
    { "id": 11, "question": "Tập hợp D = {x ∈ ℕ* | x ≤ 3} là:", "options": ["{0; 1; 2; 3}", "{1; 2; 3}", "{1; 2}", "{0; 1; 2}"], "correctAnswerIndex": 1 },
    { "id": 12, "question": "Số 24 được viết bằng số La Mã là:", "options": ["XXIV", "XXVI", "XIVV", "IVXX"], "correctAnswerIndex": 0 }
  ],
  "part2": [
    { "id": 1, "stem": "Cho tập hợp A = {2; 4; 6; 8}.", "statements": [
      { "id": 1, "statement": "4 ∈ A", "isTrue": true },
      { "id": 2, "statement": "5 ∈ A", "isTrue": false },
      { "id": 3, "statement": "A có 4 phần tử", "isTrue": true },
      { "id": 4, "statement": "A = {x ∈ ℕ | x chẵn, x < 10}", "isTrue": false, "explanation": "Tập hợp đó còn chứa số 0." }
    ] },
    { "id": 2, "stem": "Cho số tự nhiên 2 024.", "statements": [
      { "id": 1, "statement": "Chữ số hàng trăm là 0", "isTrue": true },
      { "id": 2, "statement": "Số liền sau là 2 025", "isTrue": true },
      { "id": 3, "statement": "Số liền trước là 2 022", "isTrue": false },
      { "id": 4, "statement": "Đây là số lẻ", "isTrue": false }
    ] },
    { "id": 3, "stem": "Cho tập hợp B = {x ∈ ℕ | x < 5}.", "statements": [
      { "id": 1, "statement": "B = {0; 1; 2; 3; 4}", "isTrue": true },
      { "id": 2, "statement": "5 ∈ B", "isTrue": false },
      { "id": 3, "statement": "B có 5 phần tử", "isTrue": true },
      { "id": 4, "statement": "0 ∉ B", "isTrue": false }
    ] },
    { "id": 4, "stem": "Về số La Mã:", "statements": [
      { "id": 1, "statement": "IX = 9", "isTrue": true },
      { "id": 2, "statement": "XL = 60", "isTrue": false, "explanation": "XL = 40." },
      { "id": 3, "statement": "XXX = 30", "isTrue": true },
      { "id": 4, "statement": "VV là cách viết đúng của số 10", "isTrue": false }
    ] }
  ],
  "part3": [
    { "id": 1, "question": "Tập hợp E = {x ∈ ℕ | 10 ≤ x ≤ 15} có bao nhiêu phần tử?", "correctAnswer": "6" },
    { "id": 2, "question": "Số liền sau của 1 999 là bao nhiêu?", "correctAnswer": "2000" },
    { "id": 3, "question": "Viết số XIX dưới dạng số tự nhiên.", "correctAnswer": "19" },
    { "id": 4, "question": "Có bao nhiêu số tự nhiên có hai chữ số?", "correctAnswer": "90", "explanation": "Từ 10 đến 99 có 90 số." },
    { "id": 5, "question": "Tìm số tự nhiên x biết x + 5 = 12.", "correctAnswer": "7" },
    { "id": 6, "question": "Tập hợp các số tự nhiên lẻ nhỏ hơn 10 có bao nhiêu phần tử?", "correctAnswer": "5" }
  ]
}
"#;
