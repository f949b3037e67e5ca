// src/views/mod.rs

//! Server-rendered pages.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::{models::question::Question, utils::html::clean_html};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f4f6f8; color: #1d2733; }
main { max-width: 860px; margin: 2rem auto; background: #fff; padding: 2rem; border-radius: 8px; }
.error { color: #b00020; font-weight: 600; }
.topbar { display: flex; justify-content: space-between; align-items: center; }
.question { border-top: 1px solid #e3e7eb; padding: 1rem 0; }
.options label { display: block; margin: .35rem 0; }
#timer { font-variant-numeric: tabular-nums; font-weight: 700; }
#viowarn { color: #b00020; }
"#;

fn layout(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                main { (body) }
            }
        }
    }
}

pub fn login_page(departments: &[String], duration_min: u64, error: Option<&str>) -> Markup {
    layout(
        "Assessment Login",
        html! {
            h1 { "Assessment Login" }
            p { "Duration: " (duration_min) " minutes." }
            @if !departments.is_empty() {
                p { "Departments: " (departments.join(", ")) }
            }
            @if let Some(error) = error {
                p.error { (error) }
            }
            form method="post" action="/" {
                p {
                    label for="Username" { "Username" }
                    br;
                    input #Username type="text" name="Username" required autocomplete="username";
                }
                p {
                    label for="Password" { "Password" }
                    br;
                    input #Password type="password" name="Password" required autocomplete="current-password";
                }
                button type="submit" { "Login" }
            }
        },
    )
}

pub fn instructions_page(name: &str, username: &str, duration_min: u64, max_violations: u32) -> Markup {
    layout(
        "Instructions",
        html! {
            h1 { "Instructions" }
            p { "Welcome, " (name) " (" (username) ")." }
            ul {
                li { "You have " (duration_min) " minutes. The test submits itself when time runs out." }
                li { "The test runs in fullscreen. Leaving fullscreen, switching tabs or apps, or reloading the page counts as a violation." }
                li { "After " (max_violations) " violations the next one submits your test automatically." }
                li { "Your answers are saved as you go. You can log in only once." }
            }
            a href="/exam" { "Start the test" }
            " · "
            a href="/logout" { "Logout" }
        },
    )
}

/// Identity shown in the exam header.
pub struct ExamHeader<'a> {
    pub username: &'a str,
    pub name: &'a str,
    pub roll_no: &'a str,
    pub department: &'a str,
}

pub fn exam_page(
    header: &ExamHeader<'_>,
    questions: &[Question],
    duration_min: u64,
    max_violations: u32,
) -> Markup {
    layout(
        "Assessment",
        html! {
            div.topbar {
                div {
                    strong { (header.name) }
                    " · " (header.roll_no) " · " (header.department) " · " (header.username)
                }
                div { "Time left: " span #timer { "--:--:--" } }
            }
            p #viowarn { "Violations: 0 / " (max_violations) }
            button #goFS type="button" { "Enter fullscreen" }
            form #examForm method="post" action="/exam" {
                @for (idx, question) in questions.iter().enumerate() {
                    div.question {
                        p {
                            strong { "Q" (idx + 1) ". " }
                            (PreEscaped(clean_html(&question.text)))
                        }
                        div.options {
                            @for option in &question.options {
                                label {
                                    input type="radio" name=(question.id) value=(option);
                                    " " (option)
                                }
                            }
                        }
                    }
                }
                @if questions.is_empty() {
                    p { "No questions are available for your department." }
                }
                input #answers_json type="hidden" name="answers_json" value="{}";
                button type="submit" { "Submit" }
            }
            script {
                (PreEscaped(format!(
                    "window.EXAM_DURATION_MIN = {duration_min}; window.MAX_VIOLATIONS = {max_violations};"
                )))
            }
            script src="/static/js/exam.js" {}
        },
    )
}

pub fn thank_you_page(username: &str) -> Markup {
    layout(
        "Submitted",
        html! {
            h1 { "Thank you" }
            p { "Your responses have been submitted for " (username) "." }
            script { (PreEscaped("try { localStorage.clear(); } catch (e) {}")) }
        },
    )
}

pub fn error_page(message: &str) -> Markup {
    layout(
        "Error",
        html! {
            h1 { "Something went wrong" }
            p.error { (message) }
            a href="/" { "Back to login" }
        },
    )
}
