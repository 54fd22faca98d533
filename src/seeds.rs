//! Built-in quiz bank so the app is usable without external config.

use serde_json::json;

use crate::domain::{Question, QuestionType, Quiz};

fn question(id: &str, prompt: &str, kind: QuestionType, correct: serde_json::Value, options: &[&str]) -> Question {
  Question {
    id: Some(id.into()),
    prompt: prompt.into(),
    correct_answer: correct,
    kind,
    points: 1,
    options: options.iter().map(|o| o.to_string()).collect(),
  }
}

pub fn seed_quizzes() -> Vec<Quiz> {
  vec![
    Quiz {
      id: "math-g4-fractions".into(),
      title: "Fractions: halves, quarters and thirds".into(),
      subject: "mathematics".into(),
      grade: "grade-4".into(),
      questions: vec![
        question("q1", "Which fraction is equal to one half?", QuestionType::MultipleChoice, json!("2/4"), &["1/3", "2/4", "3/5", "1/4"]),
        question("q2", "Wanjiku ate 1/4 of a cake and Otieno ate 2/4. How many quarters were eaten altogether?", QuestionType::ShortAnswer, json!(3), &[]),
        question("q3", "1/3 is greater than 1/2.", QuestionType::TrueFalse, json!(false), &["true", "false"]),
        question("q4", "What is 1/2 of 12?", QuestionType::ShortAnswer, json!(6), &[]),
      ],
    },
    Quiz {
      id: "sci-g5-water".into(),
      title: "Sources and uses of water".into(),
      subject: "science-and-technology".into(),
      grade: "grade-5".into(),
      questions: vec![
        question("q1", "Which of these is a natural source of water?", QuestionType::MultipleChoice, json!("river"), &["tap", "river", "tank", "bottle"]),
        question("q2", "Boiling makes water safe for drinking.", QuestionType::TrueFalse, json!(true), &["true", "false"]),
        question("q3", "Name the process by which water turns into vapour.", QuestionType::ShortAnswer, json!("evaporation"), &[]),
      ],
    },
    Quiz {
      id: "kis-g3-salamu".into(),
      title: "Salamu na maamkizi".into(),
      subject: "kiswahili".into(),
      grade: "grade-3".into(),
      questions: vec![
        question("q1", "Jibu la 'Habari yako?' ni lipi?", QuestionType::MultipleChoice, json!("nzuri"), &["nzuri", "kwaheri", "asante"]),
        question("q2", "Tunasema 'Shikamoo' kwa mtu mzima.", QuestionType::TrueFalse, json!(true), &["true", "false"]),
      ],
    },
  ]
}
