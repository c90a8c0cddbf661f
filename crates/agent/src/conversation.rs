use skyhop_core::domain::booking::BookingRequest;
use skyhop_core::validation::{Departure, Destination, PassengerName, Price, TravelDate};

/// Booking details pulled out of free text. Fields the text did not mention
/// stay `None` and are listed in `missing`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedIntent {
    pub passenger_name: Option<PassengerName>,
    pub departure: Option<Departure>,
    pub destination: Option<Destination>,
    pub max_price: Option<Price>,
    pub travel_date: Option<TravelDate>,
    pub missing: Vec<&'static str>,
    pub clarification_prompt: Option<String>,
}

impl ExtractedIntent {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// The validated request, or the clarification prompt when details are missing.
    pub fn into_request(self) -> Result<BookingRequest, String> {
        match (
            self.passenger_name,
            self.max_price,
            self.departure,
            self.destination,
            self.travel_date,
        ) {
            (
                Some(passenger_name),
                Some(max_price),
                Some(departure),
                Some(destination),
                Some(travel_date),
            ) => Ok(BookingRequest { passenger_name, max_price, departure, destination, travel_date }),
            _ => Err(self
                .clarification_prompt
                .unwrap_or_else(|| "Please describe the trip you want to book.".to_string())),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct IntentExtractor;

impl IntentExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> ExtractedIntent {
        let tokens = tokenize(text);

        let passenger_name = extract_passenger(&tokens).and_then(|name| PassengerName::parse(&name).ok());
        let departure = phrase_after(&tokens, &["from"]).and_then(|city| Departure::parse(&city).ok());
        let destination = extract_destination(&tokens).and_then(|city| Destination::parse(&city).ok());
        let max_price = extract_budget(&tokens);
        let travel_date = extract_date(&tokens);

        let mut missing = Vec::new();
        if passenger_name.is_none() {
            missing.push("passenger name");
        }
        if departure.is_none() {
            missing.push("departure city");
        }
        if destination.is_none() {
            missing.push("destination");
        }
        if max_price.is_none() {
            missing.push("budget");
        }
        if travel_date.is_none() {
            missing.push("travel date");
        }

        let clarification_prompt = if missing.is_empty() {
            None
        } else {
            Some(format!(
                "I need the {} to book this trip, e.g. \"Book Alice Smith from Delhi to Mumbai under 600 on 25-11-2025\".",
                missing.join(", ")
            ))
        };

        ExtractedIntent {
            passenger_name,
            departure,
            destination,
            max_price,
            travel_date,
            missing,
            clarification_prompt,
        }
    }
}

const STOP_WORDS: [&str; 13] = [
    "from", "to", "under", "below", "within", "max", "budget", "on", "for", "with", "by", "at",
    "and",
];
const FILLER_WORDS: [&str; 7] = ["a", "an", "me", "my", "flight", "ticket", "seat"];
const BUDGET_WORDS: [&str; 6] = ["under", "below", "within", "max", "budget", "upto"];

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| token.trim_matches(|character: char| matches!(character, ',' | '.' | '!' | '?' | ';' | '"' | '\'')))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token.to_ascii_lowercase().as_str())
}

fn lower(token: &str) -> String {
    token.to_ascii_lowercase()
}

/// Words after the first keyword up to the next stop word.
fn phrase_after(tokens: &[String], keywords: &[&str]) -> Option<String> {
    let keyword = tokens.iter().position(|token| keywords.contains(&lower(token).as_str()))?;
    phrase_at(tokens, keyword + 1)
}

fn phrase_at(tokens: &[String], start: usize) -> Option<String> {
    let words = tokens
        .get(start..)?
        .iter()
        .take_while(|token| !is_stop_word(token) && !looks_numeric(token))
        .map(String::as_str)
        .collect::<Vec<_>>();
    (!words.is_empty()).then(|| words.join(" "))
}

// "to" is also an infinitive ("want to fly"): prefer the "to" after "from",
// otherwise the last one in the text
fn extract_destination(tokens: &[String]) -> Option<String> {
    let is_to = |token: &String| lower(token) == "to";
    let after_from = tokens.iter().position(|token| lower(token) == "from").and_then(|from| {
        let offset = tokens[from..].iter().position(is_to)?;
        phrase_at(tokens, from + offset + 1)
    });
    after_from.or_else(|| {
        let last = tokens.iter().rposition(is_to)?;
        phrase_at(tokens, last + 1)
    })
}

// "Book Alice Smith from ..." or "Book a flight for Alice Smith from ..."
fn extract_passenger(tokens: &[String]) -> Option<String> {
    if let Some(name) = phrase_after(tokens, &["for"]) {
        return Some(name);
    }

    let start = tokens.iter().position(|token| lower(token) == "book")? + 1;
    let words = tokens[start..]
        .iter()
        .skip_while(|token| FILLER_WORDS.contains(&lower(token).as_str()))
        .take_while(|token| !is_stop_word(token) && !looks_numeric(token))
        .map(String::as_str)
        .collect::<Vec<_>>();
    (!words.is_empty()).then(|| words.join(" "))
}

fn extract_budget(tokens: &[String]) -> Option<Price> {
    let contextual = tokens.windows(2).find_map(|pair| {
        BUDGET_WORDS.contains(&lower(&pair[0]).as_str()).then(|| Price::parse(&pair[1]).ok()).flatten()
    });
    contextual.or_else(|| {
        tokens
            .iter()
            .filter(|token| token.starts_with('$') || token.starts_with('₹'))
            .find_map(|token| Price::parse(token).ok())
    })
}

fn extract_date(tokens: &[String]) -> Option<TravelDate> {
    tokens.iter().find_map(|token| TravelDate::parse_flexible(TravelDate::FIELD, token).ok())
}

fn looks_numeric(token: &str) -> bool {
    token.chars().next().is_some_and(|character| character.is_ascii_digit() || character == '$' || character == '₹')
}

#[cfg(test)]
mod tests {
    use super::IntentExtractor;

    #[test]
    fn full_sentence_yields_a_request() {
        let intent = IntentExtractor::new()
            .extract("Book Alice Smith from Delhi to Mumbai under 600 on 25-11-2025.");

        assert!(intent.is_complete(), "missing: {:?}", intent.missing);
        let request = intent.into_request().expect("request");
        assert_eq!(request.passenger_name.as_str(), "Alice Smith");
        assert_eq!(request.departure.as_str(), "Delhi");
        assert_eq!(request.destination.as_str(), "Mumbai");
        assert_eq!(request.max_price.to_string(), "600");
        assert_eq!(request.travel_date.to_string(), "2025-11-25");
    }

    #[test]
    fn passenger_after_for_and_currency_symbol_budget() {
        let intent = IntentExtractor::new().extract(
            "Please book a flight for Bob Jones from New Delhi to Chennai on 2025-12-01, budget $450",
        );

        assert_eq!(intent.passenger_name.as_ref().map(|name| name.as_str()), Some("Bob Jones"));
        assert_eq!(intent.departure.as_ref().map(|city| city.as_str()), Some("New Delhi"));
        assert_eq!(intent.destination.as_ref().map(|city| city.as_str()), Some("Chennai"));
        assert_eq!(intent.max_price.map(|price| price.to_string()), Some("450".to_string()));
        assert!(intent.clarification_prompt.is_none());
    }

    #[test]
    fn partial_text_asks_for_what_is_missing() {
        let intent = IntentExtractor::new().extract("Book flight FL421 for John Smith");

        assert_eq!(intent.passenger_name.as_ref().map(|name| name.as_str()), Some("John Smith"));
        assert_eq!(intent.missing, vec!["departure city", "destination", "budget", "travel date"]);
        let prompt = intent.into_request().expect_err("incomplete");
        assert!(prompt.contains("departure city, destination, budget, travel date"));
    }

    #[test]
    fn negative_budget_is_treated_as_missing() {
        let intent =
            IntentExtractor::new().extract("Book Alice from Delhi to Mumbai under -5 on 25-11-2025");
        assert!(intent.max_price.is_none());
        assert_eq!(intent.missing, vec!["budget"]);
    }

    #[test]
    fn infinitive_to_is_not_taken_as_the_destination() {
        let extractor = IntentExtractor::new();

        let intent = extractor
            .extract("I want to fly from Delhi to Mumbai for Alice Smith under 600 on 25-11-2025");
        assert_eq!(intent.destination.as_ref().map(|city| city.as_str()), Some("Mumbai"));
        assert_eq!(intent.departure.as_ref().map(|city| city.as_str()), Some("Delhi"));

        let intent = extractor.extract("I need to get to Chennai from Kolkata");
        assert_eq!(intent.destination.as_ref().map(|city| city.as_str()), Some("Chennai"));
        assert_eq!(intent.departure.as_ref().map(|city| city.as_str()), Some("Kolkata"));
    }
}
