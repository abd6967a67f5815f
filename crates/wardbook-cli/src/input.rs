//! Validated console prompting.
//!
//! Every prompt loops until its value satisfies the bounds the core models
//! publish, so records handed to the core are valid by construction.

use std::io::{self, Write};

use anyhow::Result;

use wardbook_core::models::{
    AGE_MAX_YEARS, DIAGNOSIS_MAX_LEN, DIAGNOSIS_MIN_LEN, NAME_MAX_LEN, NAME_MIN_LEN, ROOM_MAX,
    ROOM_MIN,
};
use wardbook_core::{TimeWindow, Ward};

/// Print `prompt` and read one trimmed line from stdin.
pub fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub fn prompt_name() -> Result<String> {
    loop {
        let name = prompt_line("Enter patient name: ")?;
        if (NAME_MIN_LEN..=NAME_MAX_LEN).contains(&name.len()) {
            return Ok(name);
        }
        println!(
            "Patient name must be between {} and {} characters long.",
            NAME_MIN_LEN, NAME_MAX_LEN
        );
    }
}

pub fn prompt_age() -> Result<u32> {
    loop {
        let line = prompt_line("Enter patient age: ")?;
        match line.parse::<u32>() {
            Ok(age) if age <= AGE_MAX_YEARS => return Ok(age),
            _ => println!(
                "Invalid age! Please enter a number between 0 and {}.",
                AGE_MAX_YEARS
            ),
        }
    }
}

pub fn prompt_diagnosis() -> Result<String> {
    loop {
        let diagnosis = prompt_line("Enter patient diagnosis: ")?;
        if (DIAGNOSIS_MIN_LEN..=DIAGNOSIS_MAX_LEN).contains(&diagnosis.len()) {
            return Ok(diagnosis);
        }
        println!(
            "Patient diagnosis must be between {} and {} characters long.",
            DIAGNOSIS_MIN_LEN, DIAGNOSIS_MAX_LEN
        );
    }
}

/// Prompt for a room that is in range and not occupied by an active patient.
pub fn prompt_free_room(ward: &Ward) -> Result<u32> {
    loop {
        let line = prompt_line("Enter patient room: ")?;
        let room = match line.parse::<u32>() {
            Ok(room) if (ROOM_MIN..=ROOM_MAX).contains(&room) => room,
            _ => {
                println!(
                    "Invalid room number: must be between {} and {}.",
                    ROOM_MIN, ROOM_MAX
                );
                continue;
            }
        };
        if ward.room_occupied(room) {
            println!("Room already occupied. Please choose another room.");
            continue;
        }
        return Ok(room);
    }
}

pub fn prompt_id(prompt: &str) -> Result<u32> {
    loop {
        let line = prompt_line(prompt)?;
        match line.parse::<u32>() {
            Ok(id) if id > 0 => return Ok(id),
            _ => println!("Invalid input. Please enter a positive number."),
        }
    }
}

pub fn confirm(prompt: &str) -> Result<bool> {
    let answer = prompt_line(prompt)?;
    Ok(answer.eq_ignore_ascii_case("y"))
}

pub fn prompt_window() -> Result<TimeWindow> {
    loop {
        let line = prompt_line("Timeframe (1=Daily, 2=Weekly, 3=Monthly): ")?;
        match line.as_str() {
            "1" => return Ok(TimeWindow::Daily),
            "2" => return Ok(TimeWindow::Weekly),
            "3" => return Ok(TimeWindow::Monthly),
            _ => println!("Please choose 1, 2, or 3."),
        }
    }
}
