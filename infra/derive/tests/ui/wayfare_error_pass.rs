use std::borrow::Cow;
use wayfare_derive::wayfare_error;

#[wayfare_error]
pub enum GatewayError {
    #[error("Parse error{}: {source}", format_context(.context))]
    Parse {
        #[source]
        source: std::num::ParseIntError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn amount(raw: &str) -> Result<u64, GatewayError> {
    raw.parse::<u64>().context("Reading amount")
}

fn main() {
    let _ = amount("12");
}
