use serde::Serializer;

// JSON.parse do lado do front quebra acima de 2^53 - 1, então campos BIGINT
// (tamanho de arquivo, timestamp em ms) saem como número quando cabem e como
// string quando não cabem.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

pub fn i64_safe<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value)
    } else {
        serializer.serialize_str(&value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Wrapper {
        #[serde(serialize_with = "i64_safe")]
        value: i64,
    }

    #[test]
    fn valor_dentro_da_faixa_segura_vira_numero() {
        let json = serde_json::to_value(Wrapper { value: 1024 }).unwrap();
        assert_eq!(json["value"], serde_json::json!(1024));
    }

    #[test]
    fn valor_acima_da_faixa_segura_vira_string() {
        let json = serde_json::to_value(Wrapper {
            value: MAX_SAFE_INTEGER + 1,
        })
        .unwrap();
        assert_eq!(json["value"], serde_json::json!("9007199254740992"));
    }

    #[test]
    fn limite_exato_ainda_e_numero() {
        let json = serde_json::to_value(Wrapper {
            value: MAX_SAFE_INTEGER,
        })
        .unwrap();
        assert!(json["value"].is_number());
    }
}
