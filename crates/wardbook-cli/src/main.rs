//! Interactive console front end for the wardbook patient registry.

mod input;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::error;

use wardbook_core::{DataPaths, FileTeeSink, PatientRecord, Ward};

fn main() -> Result<()> {
    env_logger::init();

    let data_dir: PathBuf = std::env::args().nth(1).unwrap_or_else(|| ".".into()).into();
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;

    let mut ward = Ward::open(DataPaths::in_dir(&data_dir));
    println!("Patient system ready ({} active patients).", ward.active_count());

    loop {
        print_menu();
        match input::prompt_line("Choice: ")?.as_str() {
            "1" => admit(&mut ward)?,
            "2" => view_all(&ward),
            "3" => search(&ward)?,
            "4" => discharge(&mut ward)?,
            "5" => admission_report(&ward)?,
            "6" => discharge_report(&ward)?,
            "7" => room_usage_report(&ward),
            "0" => {
                println!("Goodbye.");
                return Ok(());
            }
            other => println!("Unknown option '{}'.", other),
        }
    }
}

fn print_menu() {
    println!();
    println!("=== Wardbook ===");
    println!("1. Admit patient");
    println!("2. View all patients");
    println!("3. Search patient by id");
    println!("4. Discharge patient");
    println!("5. Admission report");
    println!("6. Discharge report");
    println!("7. Room usage report");
    println!("0. Exit");
}

fn admit(ward: &mut Ward) -> Result<()> {
    let name = input::prompt_name()?;
    let age = input::prompt_age()?;
    let diagnosis = input::prompt_diagnosis()?;
    let room = input::prompt_free_room(ward)?;

    match ward.admit(name, age, diagnosis, room) {
        Ok(patient) => {
            println!("--- Patient Added ---");
            print_patient(&patient);
        }
        Err(err) => println!("Could not admit patient: {}", err),
    }
    Ok(())
}

fn view_all(ward: &Ward) {
    if ward.active_count() == 0 {
        println!("No patients admitted!");
        return;
    }
    for patient in ward.patients() {
        print_patient(patient);
    }
}

fn search(ward: &Ward) -> Result<()> {
    let id = input::prompt_id("Enter a patient id: ")?;
    match ward.find(id) {
        Some(patient) => print_patient(patient),
        None => println!("Patient doesn't exist!"),
    }
    Ok(())
}

fn discharge(ward: &mut Ward) -> Result<()> {
    if ward.active_count() == 0 {
        println!("No patients to discharge!");
        return Ok(());
    }

    let id = input::prompt_id("Enter id of patient to discharge: ")?;
    let Some(patient) = ward.find(id) else {
        println!("Patient not found!");
        return Ok(());
    };

    println!("Patient ID: {}", patient.id);
    println!("Patient Name: {}", patient.name);
    if !input::confirm("Are you sure you want to discharge this patient? (y/n) ")? {
        println!("Patient discharge cancelled.");
        return Ok(());
    }

    match ward.discharge(id) {
        Ok(_) => println!("Patient has been discharged!"),
        Err(err) => {
            error!("discharge of patient {} failed: {}", id, err);
            println!("Discharge failed; patient remains active: {}", err);
        }
    }
    Ok(())
}

fn admission_report(ward: &Ward) -> Result<()> {
    let window = input::prompt_window()?;
    let path = ward.paths().admission_reports.clone();
    let mut sink = FileTeeSink::open(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    ward.admission_report(window, &mut sink)?;
    println!();
    println!("Report successfully written to {}", path.display());
    Ok(())
}

fn discharge_report(ward: &Ward) -> Result<()> {
    let window = input::prompt_window()?;
    let path = ward.paths().discharge_reports.clone();
    let mut sink = FileTeeSink::open(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    ward.discharge_report(window, &mut sink)?;
    println!();
    println!("Discharge report successfully written to {}", path.display());
    Ok(())
}

fn room_usage_report(ward: &Ward) {
    let mut sink = ConsoleSink;
    if let Err(err) = ward.room_usage_report(&mut sink) {
        println!("Could not produce room usage report: {}", err);
    }
}

fn print_patient(patient: &PatientRecord) {
    println!("Patient ID: {}", patient.id);
    println!("Patient Name: {}", patient.name);
    println!("Age: {}", patient.age_years);
    println!("Diagnosis: {}", patient.diagnosis);
    println!("Room Number: {}", patient.room_number);
    println!(
        "Admitted: {}",
        patient
            .admitted_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d")
    );
    println!("---------------------------------------");
}

/// Console-only sink for the room usage report, which has no transcript file.
struct ConsoleSink;

impl wardbook_core::ReportSink for ConsoleSink {
    fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        println!("{}", line);
        Ok(())
    }
}
