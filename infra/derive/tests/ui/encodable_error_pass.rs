use encodable_derive::encodable_error;
use std::borrow::Cow;

#[encodable_error]
pub enum DemoError {
    #[error("IO error{}: {source}", Self::format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Unknown key `{key}`{}", Self::format_context(.context))]
    UnknownKey { key: String, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", Self::format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn lookup(key: &str) -> Result<(), DemoError> {
    Err(DemoError::UnknownKey { key: key.to_owned(), context: None })
}

fn main() {
    let err = lookup("id").context("reading row").unwrap_err();
    assert_eq!(err.context_str(), Some("reading row"));
    assert_eq!(err.to_string(), "Unknown key `id` (reading row)");

    let io: Result<(), DemoError> = Err(std::io::Error::other("disk")).context("opening file");
    assert!(matches!(io, Err(DemoError::Io { .. })));

    let internal: DemoError = "boom".into();
    assert!(internal.context_str().is_none());
}
