//! Spanish display labels for category and variable keys

/// Human title of a category or variable key; unknown keys map to themselves
pub fn title(key: &str) -> &str {
    match key {
        // categories
        "HIRING" => "¿Qué tipo de vínculo laboral tienen los periodistas?",
        "PLATFORMS" => "¿En qué plataformas publican?",
        "THEMES" => "¿Cuáles son las temáticas de su agenda informativa?",
        "INCOME" | "FINANCING" => "¿De dónde provienen sus ingresos?",
        "THREATS" => "¿Experimentaron agresiones o amenazas en 2024?",

        // hiring
        "CONTRATO INDEFINIDO" => "Contrato Indefinido",
        "OTRAS" => "Otras Modalidades",
        "TRABAJO INDEPENDIENTE" => "Trabajo Independiente",
        "PRACTICA PROFESIONAL" => "Práctica Profesional",
        "CONTRATO LIMITADO" => "Contrato Limitado",
        "CONTRATO POR PIEZAS" => "Contrato por Piezas",
        "EMPLEO INFORMAL" => "Empleo Informal",
        "COMISIÓN" => "Comisión",
        "TRABAJO VOLUNTARIO" => "Trabajo Voluntario",

        // platforms
        "RADIO" => "Radio",
        "REVISTA" => "Revista",
        "X" => "X (Twitter)",
        "INSTAGRAM" => "Instagram",
        "TIKTOK" => "TikTok",
        "PRINT" => "Impreso",
        "WHATSAPP" => "WhatsApp",
        "NEWSLETTER" => "Newsletter",
        "FACEBOOK" => "Facebook",
        "BLOG" => "Blog",
        "TWITCH" => "Twitch",
        "TELEGRAM" => "Telegram",
        "YOUTUBE" => "YouTube",
        "PODCAST" => "Podcast",
        "WEBSITE" => "Sitio Web",
        "TV" => "Televisión",

        // themes
        "INVESTIGACIÓN" => "Investigación",
        "EMERGENCIAS" => "Emergencias",
        "MEDIO AMBIENTE" => "Medio Ambiente",
        "SOCIAL" => "Social",
        "SEGURIDAD" => "Seguridad",
        "ECONOMÍA" => "Economía",
        "DERECHOS" => "Derechos",
        "GOBIERNO" => "Gobierno",
        "SERVICIOS" => "Servicios",

        // threats
        "CRIMEN ORGANIZADO" => "Crimen Organizado",
        "NO RECIBE" => "No Recibe",
        "JUDICIAL" => "Judicial",
        "FÍSICAS" => "Físicas",
        "AMENAZAS DIRECTAS" => "Amenazas Directas",
        "NO RESPONDE" => "No Responde",
        "ECONÓMICAS" => "Económicas",
        "AMENAZAS DIGITALES" => "Amenazas Digitales",

        // income
        "MEMBRESÍAS" => "Membresías",
        "FINANCIACIÓN PÚBLICA" => "Financiación Pública",
        "VENTA DE PRODUCTOS" => "Venta de Productos",
        "CROWDFUNDING" => "Crowdfunding",
        "SUBSCRIPCIONES" => "Suscripciones",
        "CONTENIDO PARA CLIENTES" => "Contenido para Clientes",
        "PUBLIREPORTAJES" => "Publireportajes",
        "DONACIONES PARTICULARES" => "Donaciones Particulares",
        "PAUTA DE VENTA DIRECTA" => "Pauta de Venta Directa",
        "PAUTA PROGRAMÁTICA" => "Pauta Programática",
        "ORGANIZACIÓN DE EVENTOS" => "Organización de Eventos",
        "CONSULTORÍA" => "Consultoría",
        "CUSTOM_ANSWERS" => "Otras Respuestas",
        "SERVICIOS DE FORMACIÓN" => "Servicios de Formación",
        "SUBSIDIOS O GRANTS" => "Subsidios o Grants",

        other => other,
    }
}

/// Subtitle under a category title, empty when the category has none
pub fn subtitle(category: &str) -> &'static str {
    match category {
        "HIRING" => "Porcentaje de medios que contratan periodistas mediante…",
        "INCOME" => "Porcentaje de medios que reciben ingresos provenientes de…",
        "PLATFORMS" => "Porcentaje de medios que tienen presencia en…",
        "THEMES" => "Porcentaje de medios que cubren temas de…",
        "THREATS" => "Porcentaje de medios cuyos periodistas sufrieron…",
        _ => "",
    }
}

/// Title of a variable, looked up without its percentage suffix
pub fn variable_title(var: &str) -> &str {
    title(crate::stats::absolute_variable(var))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys() {
        assert_eq!(title("TIKTOK"), "TikTok");
        assert_eq!(title("INCOME"), title("FINANCING"));
        assert_eq!(variable_title("WEBSITE_PCT"), "Sitio Web");
    }

    #[test]
    fn test_unknown_keys_map_to_themselves() {
        assert_eq!(title("SOMETHING ELSE"), "SOMETHING ELSE");
        assert_eq!(subtitle("FINANCING"), "");
    }
}
