//! Shared fixture for unit tests

use crate::data::{parse_dataset, Dataset};

pub const SAMPLE_JSON: &str = r#"{
  "argentina": {
    "country": [
      {
        "BASIC_INFO": {"KEY": "AR", "NAME": "Argentina", "LEVEL": "country", "NEWS_ORG_COUNT": 190},
        "HIRING": {
          "CONTRATO INDEFINIDO": 54, "CONTRATO INDEFINIDO_PCT": 0.284,
          "TRABAJO INDEPENDIENTE": 54, "TRABAJO INDEPENDIENTE_PCT": 0.284
        }
      }
    ],
    "large_units": [
      {
        "BASIC_INFO": {"KEY": "AR-14", "NAME": "Córdoba", "PARENT": "argentina", "LEVEL": "large_units", "NEWS_ORG_COUNT": 100},
        "CENTROID": [-64.2, -31.4],
        "BBOX": [-65.8, -35.0, -61.7, -29.5],
        "HIRING": {
          "CONTRATO INDEFINIDO": 10, "CONTRATO INDEFINIDO_PCT": 0.1,
          "TRABAJO INDEPENDIENTE": 30, "TRABAJO INDEPENDIENTE_PCT": 0.3
        },
        "PLATFORMS": {"RADIO": 60, "RADIO_PCT": 0.6, "TIKTOK": 5, "TIKTOK_PCT": 0.05},
        "NARRATIVE": {"TITLE": "Un desierto que avanza", "RESUMEN": "Córdoba tiene <100> medios."}
      },
      {
        "BASIC_INFO": {"KEY": "AR-06", "NAME": "Buenos Aires", "PARENT": "argentina", "LEVEL": "large_units", "NEWS_ORG_COUNT": 50},
        "CENTROID": {"lon": -58.4, "lat": -34.6},
        "BBOX": [[-63.4, -41.0], [-56.7, -33.3]],
        "HIRING": {
          "CONTRATO INDEFINIDO": 40, "CONTRATO INDEFINIDO_PCT": 0.8,
          "TRABAJO INDEPENDIENTE": 5, "TRABAJO INDEPENDIENTE_PCT": 0.1
        },
        "PLATFORMS": {"RADIO": 20, "RADIO_PCT": 0.4, "TIKTOK": 10, "TIKTOK_PCT": 0.2}
      },
      {
        "BASIC_INFO": {"KEY": "AR-X", "NAME": "Misiones", "PARENT": "argentina", "LEVEL": "large_units", "NEWS_ORG_COUNT": "n/a"},
        "HIRING": {"CONTRATO INDEFINIDO": 3, "CONTRATO INDEFINIDO_PCT": 0.3}
      },
      {
        "BASIC_INFO": {"KEY": "AR-94", "NAME": "Tierra del Fuego", "PARENT": "argentina", "LEVEL": "large_units", "NEWS_ORG_COUNT": 10},
        "HIRING": {"CONTRATO INDEFINIDO": 1, "CONTRATO INDEFINIDO_PCT": 0.1}
      }
    ],
    "small_units": [
      {
        "BASIC_INFO": {"KEY": "AR-14-098", "NAME": "Río Cuarto", "PARENT": "Córdoba", "LEVEL": "small_units", "NEWS_ORG_COUNT": 20},
        "CENTROID": [-64.35, -33.13],
        "HIRING": {
          "CONTRATO INDEFINIDO": 2, "CONTRATO INDEFINIDO_PCT": 0.1,
          "TRABAJO INDEPENDIENTE": 10, "TRABAJO INDEPENDIENTE_PCT": 0.5
        }
      },
      {
        "BASIC_INFO": {"KEY": "AR-14-161", "NAME": "Villa María", "PARENT": "Córdoba", "LEVEL": "small_units", "NEWS_ORG_COUNT": 10},
        "CENTROID": [-63.24, -32.41],
        "HIRING": {
          "CONTRATO INDEFINIDO": 1, "CONTRATO INDEFINIDO_PCT": 0.1,
          "TRABAJO INDEPENDIENTE": 9, "TRABAJO INDEPENDIENTE_PCT": 0.9
        }
      },
      {
        "BASIC_INFO": {"KEY": "AR-14-140", "NAME": "San Francisco", "PARENT": "Córdoba", "LEVEL": "small_units", "NEWS_ORG_COUNT": 30},
        "HIRING": {
          "CONTRATO INDEFINIDO": 15, "CONTRATO INDEFINIDO_PCT": 0.5,
          "TRABAJO INDEPENDIENTE": 3, "TRABAJO INDEPENDIENTE_PCT": 0.1
        }
      },
      {
        "BASIC_INFO": {"KEY": "AR-06-441", "NAME": "La Plata", "PARENT": "Buenos Aires", "LEVEL": "small_units", "NEWS_ORG_COUNT": 25},
        "HIRING": {"CONTRATO INDEFINIDO": 5, "CONTRATO INDEFINIDO_PCT": 0.2}
      }
    ]
  },
  "mexico": {
    "large_units": [
      {
        "BASIC_INFO": {"KEY": 9, "NAME": "Ciudad de México", "PARENT": "mexico", "LEVEL": "large_units", "NEWS_ORG_COUNT": 40},
        "HIRING": {"CONTRATO INDEFINIDO": 8, "CONTRATO INDEFINIDO_PCT": 0.2}
      }
    ],
    "small_units": [
      {
        "BASIC_INFO": {"KEY": "9-010", "NAME": "Álvaro Obregón", "PARENT": "Ciudad de México", "LEVEL": "small_units", "NEWS_ORG_COUNT": 12},
        "HIRING": {"CONTRATO INDEFINIDO": 3, "CONTRATO INDEFINIDO_PCT": 0.25}
      }
    ]
  }
}"#;

pub fn sample_dataset() -> Dataset {
    let mut bytes = SAMPLE_JSON.as_bytes().to_vec();
    parse_dataset(&mut bytes).expect("fixture parses")
}
