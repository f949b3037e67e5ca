use ammonia;

/// Clean question text pulled from the question bank.
///
/// Sheet authors may use basic formatting (<b>, <i>, <code>, <sub>, ...).
/// Whitelisted tags survive, while <script>, event handler attributes and
/// similar are stripped before the text is embedded in the exam page.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
