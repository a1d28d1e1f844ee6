//! User-facing strings and result formatting
//!
//! The console speaks Portuguese (pt-BR), matching the default speech
//! locale.

use crate::platform::battery::BatteryStatus;
use crate::platform::geolocation::Position;
use crate::platform::orientation::Rotation;

pub const LOCATING: &str = "Obtendo localização...";
pub const BATTERY_LOADING: &str = "Obtendo informações da bateria...";
pub const BATTERY_UNSUPPORTED: &str = "API de Bateria não suportada neste sistema.";
pub const ORIENTATION_PROMPT: &str = "Mova seu dispositivo...";

pub const SPEECH_UNSUPPORTED: &str = "Síntese de voz não suportada";
pub const GEOLOCATION_UNSUPPORTED: &str = "Geolocalização não suportada";
pub const NOTIFICATION_UNSUPPORTED: &str = "Notificações não suportadas";
pub const CLIPBOARD_UNSUPPORTED: &str = "Área de transferência não suportada";
pub const VIBRATION_UNSUPPORTED: &str = "Vibration API não suportada";
pub const ORIENTATION_UNSUPPORTED: &str = "Device Orientation API não suportada";

pub const NOTIFICATION_NEEDS_PERMISSION: &str = "Por favor, permita as notificações primeiro.";
pub const NOTIFICATION_TITLE: &str = "Olá!";
pub const NOTIFICATION_BODY: &str = "Esta é uma notificação de teste";

pub const COPY_LABEL: &str = "Copiar";
pub const COPIED_LABEL: &str = "Copiado!";

pub fn location(position: &Position) -> String {
    format!(
        "Latitude: {}\nLongitude: {}",
        position.latitude, position.longitude
    )
}

pub fn location_error(message: &str) -> String {
    format!("Erro: {}", message)
}

pub fn permission_result(granted: bool) -> String {
    format!("Permissão {}", if granted { "concedida" } else { "negada" })
}

pub fn permission_error(message: &str) -> String {
    format!("Erro ao solicitar permissão: {}", message)
}

pub fn battery(status: &BatteryStatus) -> String {
    format!(
        "Carregando: {} | Nível: {}%",
        if status.charging { "Sim" } else { "Não" },
        status.percent()
    )
}

pub fn battery_error(message: &str) -> String {
    format!("Erro ao obter informações da bateria: {}", message)
}

pub fn copy_error(message: &str) -> String {
    format!("Erro ao copiar: {}", message)
}

pub fn paste_error(message: &str) -> String {
    format!("Erro ao colar: {}", message)
}

pub fn orientation(rotation: &Rotation) -> String {
    format!(
        "Rotação Z (alpha): {}°\nRotação X (beta): {}°\nRotação Y (gamma): {}°",
        rotation.alpha, rotation.beta, rotation.gamma
    )
}
