use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, multispace0},
    combinator::{map_res, opt, recognize},
    sequence::{pair, preceded},
    IResult,
};

use crate::errors::ParseError;
use crate::ride::{Cost, Duration, RideId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RideCommand {
    Insert(RideId, Cost, Duration),
    UpdateTrip(RideId, Duration),
    GetNextRide,
    CancelRide(RideId),
    Print(RideId),
    PrintRange(RideId, RideId),
}

/// Parses one command-log line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<RideCommand>, ParseError> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    match parse_command(line) {
        Ok((rest, command)) if rest.trim().is_empty() => Ok(Some(command)),
        _ => Err(ParseError::InvalidCommand(line.trim().to_owned())),
    }
}

pub fn parse_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, _) = multispace0(input)?;
    alt((
        parse_insert_command,
        parse_update_trip_command,
        parse_get_next_ride_command,
        parse_cancel_ride_command,
        parse_print_range_command,
        parse_print_command,
    ))(input)
}

fn parse_insert_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, _) = tag("Insert")(input)?;
    let (input, _) = parse_open(input)?;
    let (input, id) = parse_number(input)?;
    let (input, cost) = parse_next_number(input)?;
    let (input, duration) = parse_next_number(input)?;
    let (input, _) = parse_close(input)?;
    Ok((input, RideCommand::Insert(id, cost, duration)))
}

fn parse_update_trip_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, _) = tag("UpdateTrip")(input)?;
    let (input, _) = parse_open(input)?;
    let (input, id) = parse_number(input)?;
    let (input, duration) = parse_next_number(input)?;
    let (input, _) = parse_close(input)?;
    Ok((input, RideCommand::UpdateTrip(id, duration)))
}

fn parse_get_next_ride_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, _) = tag("GetNextRide")(input)?;
    let (input, _) = parse_open(input)?;
    let (input, _) = parse_close(input)?;
    Ok((input, RideCommand::GetNextRide))
}

fn parse_cancel_ride_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, _) = tag("CancelRide")(input)?;
    let (input, _) = parse_open(input)?;
    let (input, id) = parse_number(input)?;
    let (input, _) = parse_close(input)?;
    Ok((input, RideCommand::CancelRide(id)))
}

fn parse_print_range_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, _) = tag("Print")(input)?;
    let (input, _) = parse_open(input)?;
    let (input, low) = parse_number(input)?;
    let (input, high) = parse_next_number(input)?;
    let (input, _) = parse_close(input)?;
    Ok((input, RideCommand::PrintRange(low, high)))
}

fn parse_print_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, _) = tag("Print")(input)?;
    let (input, _) = parse_open(input)?;
    let (input, id) = parse_number(input)?;
    let (input, _) = parse_close(input)?;
    Ok((input, RideCommand::Print(id)))
}

fn parse_open(input: &str) -> IResult<&str, char> {
    preceded(multispace0, char('('))(input)
}

fn parse_close(input: &str) -> IResult<&str, char> {
    preceded(multispace0, char(')'))(input)
}

fn parse_number(input: &str) -> IResult<&str, i64> {
    preceded(
        multispace0,
        map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| s.parse::<i64>()),
    )(input)
}

fn parse_next_number(input: &str) -> IResult<&str, i64> {
    preceded(preceded(multispace0, char(',')), parse_number)(input)
}
