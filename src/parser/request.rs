// Chart request parser
//
// Format: <chart>(x: <column>, y: <column>, agg: <function>)
// Arguments are named, optional, and may appear in any order. Columns are bare
// identifiers or double-quoted strings.

use super::lexer::{identifier, string_literal, ws};
use crate::spec::ChartRequest;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{eof, map},
    multi::separated_list0,
    sequence::preceded,
    IResult,
};

fn column_name(input: &str) -> IResult<&str, String> {
    alt((string_literal, identifier))(input)
}

/// `name:` with optional whitespace around the colon
fn arg_name<'a>(name: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, char> {
    preceded(ws(tag(name)), ws(char(':')))
}

/// Parse a complete chart request
pub fn parse_request(input: &str) -> IResult<&str, ChartRequest> {
    let (input, chart_type) = ws(alt((string_literal, identifier)))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(arg_name("x"), ws(column_name)), |c| ("x", c)),
            map(preceded(arg_name("y"), ws(column_name)), |c| ("y", c)),
            map(preceded(arg_name("agg"), ws(identifier)), |f| ("agg", f)),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;
    let (input, _) = ws(eof)(input)?;

    let mut request = ChartRequest::new(chart_type);
    for (key, val) in args {
        match key {
            "x" => request = request.x(val),
            "y" => request = request.y(val),
            "agg" => request = request.aggregate(val),
            _ => {}
        }
    }

    Ok((input, request))
}
