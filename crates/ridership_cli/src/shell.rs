use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use ridership_core::{Outcome, QueryError, RidershipQueryService, StationMatch};
use ridership_model::{Coordinate, Direction};
use ridership_report::text::{NO_DIRECTION, NO_STATIONS};
use ridership_report::{
    render_breakdown, render_comparison, render_line_stops, render_monthly, render_nearby,
    render_stations, render_stop_counts, render_summary, render_weekday_ridership, render_yearly,
    write_json, write_line_chart, write_scatter_map, LineChart, ScatterMap,
};

const COMMAND_PROMPT: &str = "\nPlease enter a command (1-9, x to exit): ";
const STATION_PATTERN_PROMPT: &str = "Enter a station name (wildcards _ and %): ";
const LATITUDE: CoordinateInput = CoordinateInput {
    prompt: "Enter a latitude: ",
    name: "latitude",
    label: "Latitude",
    min: 40.0,
    max: 43.0,
};
const LONGITUDE: CoordinateInput = CoordinateInput {
    prompt: "Enter a longitude: ",
    name: "longitude",
    label: "Longitude",
    min: -88.0,
    max: -87.0,
};

struct CoordinateInput {
    prompt: &'static str,
    name: &'static str,
    label: &'static str,
    min: f64,
    max: f64,
}

pub struct ShellOptions {
    pub plot_dir: PathBuf,
    pub map_image: Option<String>,
    pub json_dir: Option<PathBuf>,
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    FindStations,
    RidershipBreakdown,
    WeekdayRidership,
    LineStops,
    StopCounts,
    YearlyRidership,
    MonthlyRidership,
    DailyComparison,
    NearbyStations,
    Exit,
}

impl Command {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Command::FindStations),
            "2" => Some(Command::RidershipBreakdown),
            "3" => Some(Command::WeekdayRidership),
            "4" => Some(Command::LineStops),
            "5" => Some(Command::StopCounts),
            "6" => Some(Command::YearlyRidership),
            "7" => Some(Command::MonthlyRidership),
            "8" => Some(Command::DailyComparison),
            "9" => Some(Command::NearbyStations),
            "x" => Some(Command::Exit),
            _ => None,
        }
    }
}

/// Whether the loop keeps reading after a command. Input running out in
/// the middle of a command ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Exit,
}

/// Line-oriented command loop over a query service.
pub struct Shell<'a, R, W> {
    service: &'a RidershipQueryService,
    options: ShellOptions,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(
        service: &'a RidershipQueryService,
        options: ShellOptions,
        input: R,
        output: W,
    ) -> Self {
        Self {
            service,
            options,
            input,
            output,
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        writeln!(self.output, "** Welcome to CTA L analysis app **")?;
        writeln!(self.output, "\nGeneral Statistics:")?;
        let summary = self
            .service
            .summary_statistics()
            .context("read general statistics")?;
        write!(self.output, "{}", render_summary(&summary))?;
        self.export("summary", &summary)?;

        loop {
            let Some(choice) = self.prompt(COMMAND_PROMPT)? else {
                break;
            };
            let Some(command) = Command::parse(&choice) else {
                writeln!(self.output, "**Error, unknown command, try again...")?;
                continue;
            };
            if command == Command::Exit {
                break;
            }
            match self.execute(command) {
                Ok(Step::Continue) => {}
                Ok(Step::Exit) => break,
                Err(err) if err.is::<QueryError>() => {
                    warn!("query failed: {err}");
                    writeln!(self.output, "**Query failed: {err}")?;
                }
                Err(err) => return Err(err),
            }
        }
        self.output.flush()?;
        Ok(())
    }

    fn execute(&mut self, command: Command) -> anyhow::Result<Step> {
        match command {
            Command::FindStations => self.find_stations(),
            Command::RidershipBreakdown => self.ridership_breakdown(),
            Command::WeekdayRidership => {
                let outcome = self.service.weekday_ridership_by_station()?;
                write!(self.output, "{}", render_weekday_ridership(&outcome))?;
                self.export("weekday_ridership", &outcome)?;
                Ok(Step::Continue)
            }
            Command::LineStops => self.line_stops(),
            Command::StopCounts => {
                let outcome = self.service.stop_counts_by_line_and_direction()?;
                write!(self.output, "{}", render_stop_counts(&outcome))?;
                self.export("stop_counts", &outcome)?;
                Ok(Step::Continue)
            }
            Command::YearlyRidership => self.yearly_ridership(),
            Command::MonthlyRidership => self.monthly_ridership(),
            Command::DailyComparison => self.daily_comparison(),
            Command::NearbyStations => self.nearby_stations(),
            Command::Exit => Ok(Step::Exit),
        }
    }

    fn find_stations(&mut self) -> anyhow::Result<Step> {
        writeln!(self.output)?;
        let Some(pattern) = self.prompt("Enter partial station name (wildcards _ and %): ")? else {
            return Ok(Step::Exit);
        };
        let stations = self.service.find_stations(&pattern)?;
        write!(self.output, "{}", render_stations(&stations))?;
        self.export("stations", &stations)?;
        Ok(Step::Continue)
    }

    fn ridership_breakdown(&mut self) -> anyhow::Result<Step> {
        writeln!(self.output)?;
        let Some(name) =
            self.prompt("Enter the name of the station you would like to analyze: ")?
        else {
            return Ok(Step::Exit);
        };
        let outcome = self.service.ridership_breakdown(&name)?;
        write!(self.output, "{}", render_breakdown(&outcome))?;
        self.export("breakdown", &outcome)?;
        Ok(Step::Continue)
    }

    fn line_stops(&mut self) -> anyhow::Result<Step> {
        writeln!(self.output)?;
        let Some(color) = self.prompt("Enter a line color (e.g. Red or Yellow): ")? else {
            return Ok(Step::Exit);
        };
        if !self.service.line_exists(&color)? {
            writeln!(self.output, "**No such line...")?;
            return Ok(Step::Continue);
        }
        let Some(direction) = self.prompt("Enter a direction (N/S/W/E): ")? else {
            return Ok(Step::Exit);
        };
        let Ok(direction) = Direction::parse(&direction) else {
            writeln!(self.output, "{NO_DIRECTION}")?;
            return Ok(Step::Continue);
        };
        let stops = self.service.line_stops(&color, direction)?;
        write!(self.output, "{}", render_line_stops(&stops, direction))?;
        self.export("line_stops", &stops)?;
        Ok(Step::Continue)
    }

    fn yearly_ridership(&mut self) -> anyhow::Result<Step> {
        writeln!(self.output)?;
        let Some(pattern) = self.prompt(STATION_PATTERN_PROMPT)? else {
            return Ok(Step::Exit);
        };
        if !self.unique_station(&pattern)? {
            return Ok(Step::Continue);
        }
        let outcome = self.service.yearly_ridership(&pattern)?;
        write!(self.output, "{}", render_yearly(&outcome))?;
        self.export("yearly_ridership", &outcome)?;
        let Outcome::Found(yearly) = outcome else {
            return Ok(Step::Continue);
        };
        let chart = LineChart::yearly(&yearly);
        self.offer_plot("Plot? (y/n) ", "yearly_ridership.html", |path| {
            write_line_chart(path, &chart)
        })
    }

    fn monthly_ridership(&mut self) -> anyhow::Result<Step> {
        writeln!(self.output)?;
        let Some(pattern) = self.prompt(STATION_PATTERN_PROMPT)? else {
            return Ok(Step::Exit);
        };
        if !self.unique_station(&pattern)? {
            return Ok(Step::Continue);
        }
        let Some(year) = self.prompt("Enter a year: ")? else {
            return Ok(Step::Exit);
        };
        let Some(year) = self.parse_year(&year)? else {
            return Ok(Step::Continue);
        };
        let monthly = self.service.monthly_ridership(&pattern, year)?;
        write!(self.output, "{}", render_monthly(&monthly, &pattern))?;
        self.export("monthly_ridership", &monthly)?;
        let chart = LineChart::monthly(&monthly, &pattern);
        self.offer_plot("\nPlot? (y/n) ", "monthly_ridership.html", |path| {
            write_line_chart(path, &chart)
        })
    }

    fn daily_comparison(&mut self) -> anyhow::Result<Step> {
        writeln!(self.output)?;
        let Some(year) = self.prompt("Year to compare against? ")? else {
            return Ok(Step::Exit);
        };
        let Some(year) = self.parse_year(&year)? else {
            return Ok(Step::Continue);
        };
        writeln!(self.output)?;
        let Some(first) = self.prompt("Enter station 1 (wildcards _ and %): ")? else {
            return Ok(Step::Exit);
        };
        if !self.unique_station(&first)? {
            return Ok(Step::Continue);
        }
        writeln!(self.output)?;
        let Some(second) = self.prompt("Enter station 2 (wildcards _ and %): ")? else {
            return Ok(Step::Exit);
        };
        if !self.unique_station(&second)? {
            return Ok(Step::Continue);
        }
        let comparison = self.service.compare_daily_ridership(&first, &second, year)?;
        write!(self.output, "{}", render_comparison(&comparison))?;
        self.export("daily_comparison", &comparison)?;
        let chart = LineChart::daily_comparison(&comparison);
        self.offer_plot("Plot? (y/n) ", "daily_comparison.html", |path| {
            write_line_chart(path, &chart)
        })
    }

    fn nearby_stations(&mut self) -> anyhow::Result<Step> {
        writeln!(self.output)?;
        let Some(latitude) = self.prompt_coordinate(&LATITUDE)? else {
            return Ok(Step::Exit);
        };
        let Some(latitude) = latitude else {
            return Ok(Step::Continue);
        };
        let Some(longitude) = self.prompt_coordinate(&LONGITUDE)? else {
            return Ok(Step::Exit);
        };
        let Some(longitude) = longitude else {
            return Ok(Step::Continue);
        };

        let stations = self
            .service
            .nearby_stations(Coordinate::new(latitude, longitude))?;
        if stations.is_empty() {
            writeln!(self.output, "{NO_STATIONS}")?;
            return Ok(Step::Continue);
        }
        write!(self.output, "{}", render_nearby(&stations))?;
        self.export("nearby_stations", &stations)?;
        let map = ScatterMap::nearby(&stations, self.options.map_image.clone());
        self.offer_plot("Plot? (y/n) ", "nearby_stations.html", |path| {
            write_scatter_map(path, &map)
        })
    }

    /// Reads one line after printing `prompt`; `None` once input is exhausted.
    fn prompt(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Outer `None` means input ended; inner `None` means the value was
    /// rejected and a message was printed.
    fn prompt_coordinate(
        &mut self,
        input: &CoordinateInput,
    ) -> anyhow::Result<Option<Option<f64>>> {
        let Some(raw) = self.prompt(input.prompt)? else {
            return Ok(None);
        };
        let Ok(value) = raw.trim().parse::<f64>() else {
            writeln!(self.output, "**Invalid {}...", input.name)?;
            return Ok(Some(None));
        };
        if !(input.min..=input.max).contains(&value) {
            writeln!(self.output, "**{} entered is out of bounds...", input.label)?;
            return Ok(Some(None));
        }
        Ok(Some(Some(value)))
    }

    fn parse_year(&mut self, raw: &str) -> anyhow::Result<Option<i32>> {
        match raw.trim().parse::<i32>() {
            Ok(year) => Ok(Some(year)),
            Err(_) => {
                writeln!(self.output, "**Invalid year...")?;
                Ok(None)
            }
        }
    }

    fn unique_station(&mut self, pattern: &str) -> anyhow::Result<bool> {
        match self.service.station_match(pattern)? {
            StationMatch::Unique(_) => Ok(true),
            StationMatch::Ambiguous(_) => {
                writeln!(self.output, "**Multiple stations found...")?;
                Ok(false)
            }
            StationMatch::Absent => {
                writeln!(self.output, "**No station found...")?;
                Ok(false)
            }
        }
    }

    fn offer_plot<F>(&mut self, prompt: &str, file_name: &str, write_chart: F) -> anyhow::Result<Step>
    where
        F: FnOnce(&Path) -> anyhow::Result<()>,
    {
        let Some(answer) = self.prompt(prompt)? else {
            return Ok(Step::Exit);
        };
        if answer.trim() != "y" {
            return Ok(Step::Continue);
        }
        let path = self.options.plot_dir.join(file_name);
        match write_chart(&path) {
            Ok(()) => {
                info!("Chart written to {}", path.display());
                writeln!(self.output, "Chart written to {}", path.display())?;
            }
            Err(err) => {
                warn!("{err:#}");
                writeln!(self.output, "**Could not write chart: {err:#}")?;
            }
        }
        Ok(Step::Continue)
    }

    fn export<T: Serialize>(&mut self, report: &str, data: &T) -> anyhow::Result<()> {
        let Some(dir) = self.options.json_dir.as_ref() else {
            return Ok(());
        };
        let path = dir.join(format!("{report}.json"));
        match write_json(&path, report, data, self.options.pretty) {
            Ok(()) => info!("JSON report written to {}", path.display()),
            Err(err) => {
                warn!("{err:#}");
                writeln!(self.output, "**Could not write report: {err:#}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridership_core::fixture::{sample_service, SCHEMA_SQL};
    use rusqlite::Connection;
    use std::fs;
    use std::io::Cursor;
    use std::time::{SystemTime, UNIX_EPOCH};

    const BANNER: &str = "** Welcome to CTA L analysis app **\n\nGeneral Statistics:\n   # of stations: 6\n   # of stops: 9\n   # of ride entries: 13\n   date range: 2020-12-31 - 2022-03-01\n   Total ridership: 12,700\n";

    fn temp_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "ridership_shell_{}_{}_{}",
            label,
            std::process::id(),
            nanos
        ));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn options(plot_dir: PathBuf) -> ShellOptions {
        ShellOptions {
            plot_dir,
            map_image: None,
            json_dir: None,
            pretty: false,
        }
    }

    fn run_with(service: &RidershipQueryService, options: ShellOptions, input: &str) -> String {
        let mut output = Vec::new();
        Shell::new(service, options, Cursor::new(input.as_bytes()), &mut output)
            .run()
            .expect("shell run");
        String::from_utf8(output).expect("utf8 output")
    }

    /// Output after the banner, with the command prompts removed.
    fn transcript(input: &str) -> String {
        let service = sample_service();
        let output = run_with(&service, options(std::env::temp_dir()), input);
        let rest = output.strip_prefix(BANNER).expect("banner");
        rest.replace(COMMAND_PROMPT, "|")
    }

    #[test]
    fn prints_banner_and_exits() {
        assert_eq!(transcript("x\n"), "|");
    }

    #[test]
    fn end_of_input_exits() {
        assert_eq!(transcript(""), "|");
        assert_eq!(
            transcript("1\n"),
            "|\nEnter partial station name (wildcards _ and %): "
        );
    }

    #[test]
    fn unknown_command_reprompts() {
        assert_eq!(
            transcript("z\n10\nx\n"),
            "|**Error, unknown command, try again...\n|**Error, unknown command, try again...\n|"
        );
    }

    #[test]
    fn find_stations_lists_matches() {
        assert_eq!(
            transcript("1\nState%\n1\nNowhere\nx\n"),
            "|\nEnter partial station name (wildcards _ and %): 2 : State/Lake\n3 : Statesville\n|\nEnter partial station name (wildcards _ and %): **No stations found...\n|"
        );
    }

    #[test]
    fn breakdown_reports_percentages_or_no_data() {
        let out = transcript("2\nClark/Lake\n2\nWashington\nx\n");
        assert!(out.contains("Percentage of ridership for the Clark/Lake station: \n  Weekday ridership: 5,700 (82.61%)\n"));
        assert!(out.contains("  Total ridership: 6,900\n"));
        assert!(out.ends_with(
            "Enter the name of the station you would like to analyze: **No data found...\n|"
        ));
    }

    #[test]
    fn weekday_and_stop_count_reports() {
        let out = transcript("3\n5\nx\n");
        assert!(out.starts_with("|Ridership on Weekdays for Each Station\nClark/Lake : 5,700 (55.34%)\n"));
        assert!(out.contains("|Number of Stops For Each Color By Direction\nBlue going N : 1 (11.11%)\n"));
    }

    #[test]
    fn line_stops_gate_on_line_and_direction() {
        assert_eq!(
            transcript("4\nPurple\nx\n"),
            "|\nEnter a line color (e.g. Red or Yellow): **No such line...\n|"
        );
        assert_eq!(
            transcript("4\nred\nn\nx\n"),
            "|\nEnter a line color (e.g. Red or Yellow): Enter a direction (N/S/W/E): Statesville (Northbound) : direction = N (not handicap accessible)\nWashington (Red) : direction = N (handicap accessible)\n|"
        );
        assert!(transcript("4\nRed\nE\nx\n").contains(
            "Enter a direction (N/S/W/E): **That line does not run in the direction chosen...\n"
        ));
        assert!(transcript("4\nRed\nup\nx\n").contains(
            "Enter a direction (N/S/W/E): **That line does not run in the direction chosen...\n"
        ));
    }

    #[test]
    fn station_gate_reports_ambiguous_and_missing() {
        assert_eq!(
            transcript("6\nState%\n6\nNowhere\nx\n"),
            "|\nEnter a station name (wildcards _ and %): **Multiple stations found...\n|\nEnter a station name (wildcards _ and %): **No station found...\n|"
        );
    }

    #[test]
    fn yearly_report_without_plot() {
        assert_eq!(
            transcript("6\nClark/Lake\nn\nx\n"),
            "|\nEnter a station name (wildcards _ and %): Yearly Ridership at Clark/Lake\n2020 : 1,000\n2021 : 4,700\n2022 : 1,200\nPlot? (y/n) |"
        );
    }

    #[test]
    fn monthly_report_validates_year() {
        assert!(transcript("7\nClark/Lake\nnext\nx\n")
            .contains("Enter a year: **Invalid year...\n|"));
        assert!(transcript("7\nClark/Lake\n2021\nn\nx\n").contains(
            "Enter a year: Monthly Ridership at Clark/Lake for 2021\n01/2021 : 2,700\n02/2021 : 2,000\n\nPlot? (y/n) |"
        ));
        assert!(transcript("7\nClark/Lake\n2019\nn\nx\n")
            .contains("Enter a year: Monthly Ridership at Clark/Lake for 2019\n\nPlot? (y/n) |"));
    }

    #[test]
    fn daily_comparison_prints_both_stations() {
        let out = transcript("8\n2021\nState/Lake\nO'Hare%\nn\nx\n");
        assert!(out.starts_with("|\nYear to compare against? \nEnter station 1 (wildcards _ and %): \nEnter station 2 (wildcards _ and %): Station 1: 2 State/Lake\n2021-01-04 800\n"));
        assert!(out.contains("Station 2: 4 O'Hare Airport\n2021-01-04 3000\n2021-01-10 1000\n"));
        assert!(out.ends_with("Plot? (y/n) |"));
        assert!(transcript("8\nlast year\nx\n").contains("**Invalid year...\n|"));
    }

    #[test]
    fn nearby_validates_coordinates() {
        assert!(transcript("9\n39.5\nx\n").contains("**Latitude entered is out of bounds...\n|"));
        assert!(transcript("9\n41.88\n-86\nx\n")
            .contains("**Longitude entered is out of bounds...\n|"));
        assert!(transcript("9\nnorth\nx\n").contains("**Invalid latitude...\n|"));
        assert!(transcript("9\n41.5\n-87.5\nx\n").contains("**No stations found...\n|"));
    }

    #[test]
    fn nearby_lists_stations_within_a_mile() {
        let out = transcript("9\n41.88\n-87.63\nn\nx\n");
        assert!(out.contains(
            "\nList of Stations Within a Mile\nClark/Lake : (41.8858, -87.630886)\nClark/Lake : (41.885737, -87.630886)\nState/Lake : (41.88574, -87.627835)\nWashington : (41.8837, -87.6278)\nWashington/Wells : (41.882695, -87.63378)\nPlot? (y/n) |"
        ));
    }

    #[test]
    fn plots_and_json_are_written_to_configured_directories() {
        let plot_dir = temp_dir("plots");
        let json_dir = temp_dir("json");
        let service = sample_service();
        let options = ShellOptions {
            plot_dir: plot_dir.clone(),
            map_image: Some("chicago.png".to_string()),
            json_dir: Some(json_dir.clone()),
            pretty: true,
        };
        let output = run_with(
            &service,
            options,
            "6\nClark/Lake\ny\n8\n2021\nClark/Lake\nState/Lake\ny\n9\n41.88\n-87.63\ny\nx\n",
        );

        let yearly = plot_dir.join("yearly_ridership.html");
        assert!(output.contains(&format!("Chart written to {}", yearly.display())));
        let comparison = fs::read_to_string(plot_dir.join("daily_comparison.html")).expect("chart");
        assert_eq!(comparison.matches("<path ").count(), 2);
        let map = fs::read_to_string(plot_dir.join("nearby_stations.html")).expect("map");
        assert!(map.contains("<image href=\"chicago.png\""));
        assert_eq!(map.matches("<circle ").count(), 5);

        for report in ["summary", "yearly_ridership", "daily_comparison", "nearby_stations"] {
            assert!(json_dir.join(format!("{report}.json")).is_file(), "{report}");
        }
        fs::remove_dir_all(&plot_dir).ok();
        fs::remove_dir_all(&json_dir).ok();
    }

    #[test]
    fn query_failure_is_reported_and_loop_continues() {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch(SCHEMA_SQL).expect("schema");
        conn.execute_batch(
            "INSERT INTO Stations VALUES (1, 'Clark/Lake');
             INSERT INTO Ridership VALUES (1, 'not a date', 'W', 10);",
        )
        .expect("rows");
        let service = RidershipQueryService::from_connection(conn).expect("service");
        let output = run_with(&service, options(std::env::temp_dir()), "6\nClark/Lake\nx\n");
        assert!(output.contains("   date range: N/A\n"));
        assert!(output.contains("**Query failed: "));
        assert!(output.ends_with(COMMAND_PROMPT));
    }
}
