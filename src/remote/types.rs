//! Wire shapes for the catalog backend and their decoding into domain types.

use serde::Deserialize;
use serde_json::Value;

use super::FetchError;
use crate::model::{Genre, Movie};

/// A movie as served by `/api/movies`. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct MovieDto {
    pub id: String,
    pub genres: Vec<String>,
    pub release_date: String,
    pub title: String,
    pub overview: String,
    pub url: String,
}

impl From<MovieDto> for Movie {
    fn from(dto: MovieDto) -> Self {
        Movie {
            id: dto.id,
            title: dto.title,
            overview: dto.overview,
            release_date: dto.release_date,
            genres: dto.genres,
            url: dto.url,
        }
    }
}

/// Decode the `/api/genres` payload: an array of `[name, count]` tuples.
///
/// Scalars are read leniently: a numeric or boolean name is taken as its text
/// and a count may be a JSON integer or a string holding one. A tuple with a
/// missing, null or structured name, or a count that is not a non-negative
/// integer, is dropped. An element that is not an array at all fails the call.
pub(crate) fn decode_genres(bytes: &[u8]) -> Result<Vec<Genre>, FetchError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| FetchError::Decode(format!("genres: {}", e)))?;
    let items = value
        .as_array()
        .ok_or_else(|| FetchError::Decode("genres: expected a JSON array".to_string()))?;

    let mut genres = Vec::with_capacity(items.len());
    let mut skipped = 0usize;

    for (idx, item) in items.iter().enumerate() {
        let tuple = item.as_array().ok_or_else(|| {
            FetchError::Decode(format!("genres[{}]: expected a [name, count] tuple", idx))
        })?;

        let name = tuple.first().and_then(scalar_text);
        let count = tuple.get(1).and_then(scalar_count);

        match (name, count) {
            (Some(name), Some(count)) => genres.push(Genre::new(name, count)),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, kept = genres.len(), "Malformed genre tuples skipped");
    }

    Ok(genres)
}

/// Text of a scalar JSON value; `None` for null, arrays and objects.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A count given as a JSON integer or as a string holding one.
fn scalar_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|c| u32::try_from(c).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Decode the `/api/movies` payload.
pub(crate) fn decode_movies(bytes: &[u8]) -> Result<Vec<Movie>, FetchError> {
    let dtos: Vec<MovieDto> = serde_json::from_slice(bytes)
        .map_err(|e| FetchError::Decode(format!("movies: {}", e)))?;
    Ok(dtos.into_iter().map(Movie::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_genres_keeps_order() {
        let genres = decode_genres(br#"[["Drama", 12], ["Action", 3]]"#).unwrap();
        assert_eq!(genres, vec![Genre::new("Drama", 12), Genre::new("Action", 3)]);
    }

    #[test]
    fn test_decode_genres_drops_malformed_tuples() {
        let payload = br#"[
            ["Fantasy", 1],
            [null, 4],
            [["Nested"], 4],
            ["NoCount"],
            ["Float", 2.5],
            ["FloatText", "2.5"],
            ["Negative", -1],
            ["Comedy", 0]
        ]"#;
        let genres = decode_genres(payload).unwrap();
        assert_eq!(genres, vec![Genre::new("Fantasy", 1), Genre::new("Comedy", 0)]);
    }

    #[test]
    fn test_decode_genres_reads_scalars_leniently() {
        let genres = decode_genres(br#"[["Drama", "5"], [7, 3], ["Ok", 1]]"#).unwrap();
        assert_eq!(
            genres,
            vec![Genre::new("Drama", 5), Genre::new("7", 3), Genre::new("Ok", 1)]
        );
    }

    #[test]
    fn test_decode_genres_empty_array() {
        assert!(decode_genres(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_genres_rejects_object() {
        let err = decode_genres(br#"{"genres": []}"#).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_decode_genres_rejects_non_tuple_element() {
        let err = decode_genres(br#"[["Drama", 1], "Action"]"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(msg) if msg.contains("genres[1]")));
    }

    #[test]
    fn test_decode_movies_ignores_unknown_keys() {
        let payload = br#"[{
            "id": "tt1",
            "genres": ["Fantasy", "Adventure"],
            "release_date": "2001-12-19",
            "title": "Fellowship",
            "overview": "A ring.",
            "url": "https://example.com/tt1",
            "rating": 8.8
        }]"#;
        let movies = decode_movies(payload).unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id, "tt1");
        assert_eq!(movies[0].release_date, "2001-12-19");
        assert_eq!(movies[0].genres, vec!["Fantasy", "Adventure"]);
    }

    #[test]
    fn test_decode_movies_missing_field_fails() {
        let payload = br#"[{"id": "tt1", "title": "No genres"}]"#;
        let err = decode_movies(payload).unwrap_err();
        assert!(err.is_decode());
        assert!(!err.is_transport());
    }
}
