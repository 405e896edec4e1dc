//! Text formatting for terminal output

use order_tracking::{OrderSnapshot, OrderStatus, Projection, SessionView};

/// `+996 555 123 456` style grouping for numbers of ten digits or more
pub fn format_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() < 10 {
        return phone.to_string();
    }
    let part = |from: usize, to: usize| chars[from..to].iter().collect::<String>();
    format!(
        "+{} {} {} {}",
        part(0, 3),
        part(3, 6),
        part(6, 9),
        part(9, chars.len())
    )
}

/// Whole minutes as `mm:ss`
pub fn format_remaining(minutes: u32) -> String {
    format!("{:02}:00", minutes)
}

pub fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Waiting",
        OrderStatus::InProgress => "In progress",
        OrderStatus::Completed => "Completed",
    }
}

pub fn package_label(snapshot: &OrderSnapshot) -> &str {
    if snapshot.package_details.is_empty() {
        return "No data";
    }
    snapshot.package_name().unwrap_or("Unnamed package")
}

/// One line describing the order
pub fn status_line(snapshot: &OrderSnapshot, projection: Option<Projection>) -> String {
    let projection = projection.unwrap_or_default();
    match snapshot.status {
        OrderStatus::Pending => format!(
            "[{}] order #{} | queue position {} | estimated {} min | {}",
            status_label(snapshot.status),
            snapshot.id,
            snapshot.queue_position,
            projection.remaining_minutes,
            package_label(snapshot),
        ),
        OrderStatus::InProgress => format!(
            "[{}] order #{} | {}% left | {} remaining | {}",
            status_label(snapshot.status),
            snapshot.id,
            projection.progress_percent,
            format_remaining(projection.remaining_minutes),
            package_label(snapshot),
        ),
        OrderStatus::Completed => format!(
            "[{}] order #{} | {} is ready | total {}",
            status_label(snapshot.status),
            snapshot.id,
            describe_car(snapshot),
            snapshot.total_price,
        ),
    }
}

/// Client, car and branch details shown once per order
pub fn order_details(snapshot: &OrderSnapshot) -> Vec<String> {
    let mut lines = vec![format!("Client: {}", snapshot.client_name)];
    if !snapshot.client_phone.is_empty() {
        lines.push(format!("Phone: {}", format_phone(&snapshot.client_phone)));
    }
    lines.push(format!("Car: {}", describe_car(snapshot)));
    if !snapshot.employee_name.is_empty() {
        lines.push(format!("Washer: {}", snapshot.employee_name));
    }
    lines.push(format!("Total: {}", snapshot.total_price));
    if !snapshot.branch_phone.is_empty() {
        lines.push(format!("Branch: {}", format_phone(&snapshot.branch_phone)));
    }
    lines
}

/// Connection details for troubleshooting
pub fn diagnostics_lines(view: &SessionView) -> Vec<String> {
    let diagnostics = &view.diagnostics;
    let reachable = match diagnostics.server_reachable {
        Some(true) => "yes",
        Some(false) => "no",
        None => "unknown",
    };
    vec![
        format!("Channel: {}", diagnostics.ws_url),
        format!("Connection attempts: {}", diagnostics.connection_attempts),
        format!("Socket state: {}", diagnostics.socket_state),
        format!(
            "Last error: {}",
            view.last_error.as_deref().unwrap_or("none")
        ),
        format!("Server reachable: {}", reachable),
    ]
}

fn describe_car(snapshot: &OrderSnapshot) -> String {
    let car = snapshot.car_description();
    match (car.is_empty(), snapshot.car_license_plate.is_empty()) {
        (true, true) => "your car".to_string(),
        (true, false) => snapshot.car_license_plate.clone(),
        (false, true) => car,
        (false, false) => format!("{} ({})", car, snapshot.car_license_plate),
    }
}
