//! Static texts sent by the bot.

/// Instructions for each menu option, in menu order.
pub const CANNED_REPLIES: &[(&str, &str)] = &[
    ("1", "📌 Para poder ayudarle, voy a necesitar:\n- Ficha técnica\n- Foto de la centralita\n- Diagnosis del vehículo con los DTC (errores)\n\n📩 Este es un mensaje enviado automáticamente."),
    ("2", "📌 Por favor, envíe:\n- Ficha técnica\n- Fotos de la llave\n- Fallos que presenta la llave\n\n📩 Este es un mensaje enviado automáticamente."),
    ("3", "📌 Por favor, envíe:\n- Ficha técnica\n- Fotos de la llave\n\n📩 Este es un mensaje enviado automáticamente."),
    ("4", "📌 Por favor, envíe:\n- Ficha técnica\n- Diagnosis del vehículo\n\n📩 Este es un mensaje enviado automáticamente."),
    ("5", "📌 Por favor, envíe:\n- Ficha técnica\n- Diagnosis del vehículo\n\n📩 Este es un mensaje enviado automáticamente."),
    ("6", "📌 Por favor, envíe:\n- Ficha técnica\n- Diagnosis del vehículo\n\n📩 Este es un mensaje enviado automaticamente."),
    ("7", "📌 Por favor, envíe:\n- Ficha técnica\n- Diagnóstico con los DTC del airbag\n- Foto de la centralita\n\n📩 Este es un mensaje enviado automáticamente."),
    ("8", "📌 Por favor, envíe:\n- Ficha técnica\n- Descripción de los errores del cuadro (si es posible, vídeo)\n\n📩 Este es un mensaje enviado automáticamente."),
    ("9", "📌 Por favor, envíe:\n- Su nombre completo\n- Número de orden\n\n📩 Este es un mensaje enviado automáticamente."),
    ("10", "📌 Por favor, describa brevemente el tipo de reparación o problema.\n\n📩 Este es un mensaje enviado automáticamente."),
];

/// Sent when a sender asks to start over.
pub const RESET_NOTICE: &str =
    "🔄 Menú reiniciado. Escriba \"hola\" o \"buenas\" para ver las opciones otra vez.";

/// Option code that shows the menu again.
pub const GO_BACK_OPTION: &str = "0";

/// Look up the reply for an option code. Only exact codes match.
pub fn canned_reply(option: &str) -> Option<&'static str> {
    CANNED_REPLIES
        .iter()
        .find(|(code, _)| *code == option)
        .map(|(_, text)| *text)
}

/// Greeting menu addressed to `name` (may be empty).
pub fn menu_text(name: &str) -> String {
    format!(
        "👋 ¡Hola {name}! Soy el *Agente AE* de la empresa *Aetronics*.\n\n\
         ❓ ¿En qué puedo ayudarle hoy? Por favor, escriba una de las siguientes opciones:\n\n\
         1️⃣ - Reparación de centralitas\n\
         2️⃣ - Reparación de llaves\n\
         3️⃣ - Duplicado de llave\n\
         4️⃣ - Reprogramación de EGR, AdBlue, DPF o aumento de potencia\n\
         5️⃣ - Reparación de EZS Mercedes\n\
         6️⃣ - Reparación de ABS\n\
         7️⃣ - Reparación de ECU de airbag – Clear\n\
         8️⃣ - Reparación de cuadro de instrumentos\n\
         9️⃣ - Consulta sobre reparaciones pendientes\n\
         🔟 - Otras reparaciones\n\
         0️⃣ - Volver atrás\n\n\
         🕑 El horario es de lunes a jueves: 8:30 a 14:00 y de 15:00 a 18:00. Los viernes de 8:30 a 14:30\n\n\
         📞 Nuestro horario de atención telefónica es de 10:00 a 14:00 - 16:00 a 17:30\n\n\
         💡 Si este mensaje ya ha sido enviado, por favor ignore."
    )
}
