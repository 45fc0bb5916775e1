// ABOUTME: POSIX shell quoting for remote command lines.
// ABOUTME: Single-quotes unsafe arguments so the remote shell sees the original argv.

use std::borrow::Cow;

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-' | '_')
}

/// Quote one argument for a POSIX shell.
///
/// `$'b` becomes `'$'"'"'b'`; the empty string becomes `''`.
pub fn quote(arg: &str) -> Cow<'_, str> {
    if arg.is_empty() {
        return Cow::Borrowed("''");
    }
    if arg.chars().all(is_safe) {
        return Cow::Borrowed(arg);
    }
    Cow::Owned(format!("'{}'", arg.replace('\'', r#"'"'"'"#)))
}

/// Quote each argument and join them with single spaces.
pub fn join<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .map(|arg| quote(arg.as_ref()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_mixed_arguments() {
        assert_eq!(join(["", "such/safe/123", "$'b"]), r#"'' such/safe/123 '$'"'"'b'"#);
    }

    #[test]
    fn safe_arguments_are_untouched() {
        assert_eq!(quote("user@host:/tmp/a_b-c,d=e+f%g"), "user@host:/tmp/a_b-c,d=e+f%g");
    }

    #[test]
    fn whitespace_and_metacharacters_are_quoted() {
        assert_eq!(quote("a b"), "'a b'");
        assert_eq!(quote("*"), "'*'");
        assert_eq!(quote("x;rm"), "'x;rm'");
        assert_eq!(quote("naïve"), "'naïve'");
    }

    #[test]
    fn empty_join_is_empty_string() {
        assert_eq!(join(Vec::<String>::new()), "");
    }
}
