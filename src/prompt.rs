//! Interactive text prompt
//!
//! Asks for an amount, lists the currency directory, reads a menu number and
//! prints the converted amount. Input errors re-prompt instead of aborting.

use std::io::{self, BufRead, Write};

use crate::convert::{parse_amount, ConversionError, Converter};
use crate::currency::Currency;

const AMOUNT_PROMPT: &str = "Enter amount to convert: ";
const INVALID_AMOUNT: &str = "Given input is not valid.";
const SELECT_PROMPT: &str = "Select currency to convert to: ";
const INVALID_SELECTION: &str = "The number inputted does not correspond to a currency.";

/// Writes the numbered currency list, starting at 1
pub fn print_currency_names<W: Write>(output: &mut W, currencies: &[Currency]) -> io::Result<()> {
    for (i, currency) in currencies.iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, currency.name)?;
    }
    Ok(())
}

/// Reads one trimmed line; `None` at end of input
fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Runs one conversion session
///
/// Returns `Ok(None)` if input ends before the conversion completes,
/// otherwise the printed result.
pub fn run<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    converter: &Converter<'_>,
) -> io::Result<Option<String>> {
    if let Some(base) = converter.base_currency() {
        writeln!(output, "Converting from: {}", base.name)?;
    }

    let currencies = converter.list_currencies();

    'amount: loop {
        let amount = loop {
            write!(output, "{}", AMOUNT_PROMPT)?;
            output.flush()?;
            let Some(line) = read_line(input)? else {
                return Ok(None);
            };
            writeln!(output)?;

            match parse_amount(&line) {
                Ok(amount) => break amount,
                Err(_) => writeln!(output, "{}", INVALID_AMOUNT)?,
            }
        };

        writeln!(output, "{}", SELECT_PROMPT)?;

        loop {
            print_currency_names(output, currencies)?;
            write!(output, "> ")?;
            output.flush()?;

            let Some(line) = read_line(input)? else {
                return Ok(None);
            };

            let selected = line
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| currencies.get(index));

            let Some(currency) = selected else {
                writeln!(output, "{}", INVALID_SELECTION)?;
                writeln!(output)?;
                writeln!(output, "{}", SELECT_PROMPT)?;
                continue;
            };

            match converter.convert(amount, currency.code) {
                Ok(converted) => {
                    let text = converted.to_string();
                    writeln!(output, "{}", text)?;
                    return Ok(Some(text));
                }
                Err(ConversionError::UnknownCurrency(_)) => {
                    writeln!(
                        output,
                        "No exchange rate is available for {} ({}).",
                        currency.name, currency.code
                    )?;
                    writeln!(output)?;
                    writeln!(output, "{}", SELECT_PROMPT)?;
                }
                // The product does not fit; ask for a new amount
                Err(ConversionError::InvalidAmount(_)) => {
                    writeln!(output, "{}", INVALID_AMOUNT)?;
                    continue 'amount;
                }
                Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e)),
            }
        }
    }
}
