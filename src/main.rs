use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use kalkumath::calculators::{
  ComputationResult, IntegralKind, derivative_calculator, integral_calculator,
  limit_calculator, real_calculator,
};
use kalkumath::functions::{
  AreaMethod, Axis, Direction, GraphOptions, GraphView, PlotMode,
  SamplerOptions, render_graph, sample_function,
};
use kalkumath::tutor::{
  DEFAULT_QUESTION_COUNT, ExplanationState, LocalQuizGenerator,
  OfflineExplainer, QuizGenerator, QuizSession, QuizState, TutorSession,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
  Indefinite,
  Definite,
  Area,
  Volume,
}

#[derive(Clone, Copy, ValueEnum)]
enum AxisArg {
  X,
  Y,
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
  Both,
  Left,
  Right,
}

#[derive(Subcommand)]
enum Commands {
  /// Evaluate a formula at a value of x
  Eval {
    expression: String,
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    x: f64,
  },
  /// Integrals, areas and volumes of revolution
  Integral {
    expression: String,
    #[arg(short, long, value_enum, default_value = "definite")]
    kind: KindArg,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    lower: String,
    #[arg(long, default_value = "2", allow_hyphen_values = true)]
    upper: String,
    #[arg(long, value_enum, default_value = "x")]
    axis: AxisArg,
    /// Count regions below the axis positively instead of netting them
    #[arg(long)]
    absolute: bool,
    #[command(flatten)]
    output: OutputArgs,
  },
  /// Numeric limit at a point or at infinity ("inf")
  Limit {
    expression: String,
    #[arg(short, long, allow_hyphen_values = true)]
    approach: String,
    #[arg(short, long, value_enum, default_value = "both")]
    direction: DirectionArg,
    #[command(flatten)]
    output: OutputArgs,
  },
  /// n-th derivative
  Derivative {
    expression: String,
    #[arg(short, long, default_value_t = 1,
      value_parser = clap::value_parser!(u32).range(1..=5))]
    order: u32,
    #[command(flatten)]
    output: OutputArgs,
  },
  /// Sample a function and write an SVG chart
  Plot {
    expression: String,
    #[arg(long, default_value_t = -10.0, allow_negative_numbers = true)]
    start: f64,
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    end: f64,
    #[arg(long, default_value_t = 100)]
    points: usize,
    /// Also draw the mirrored curve of a solid of revolution
    #[arg(long)]
    volume: bool,
    /// Where to write the SVG (prints the samples when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Analyze a constant real expression
  Real {
    expression: String,
    #[command(flatten)]
    output: OutputArgs,
  },
  /// Take a locally generated quiz on stdin
  Quiz {
    #[arg(long, default_value_t = 1)]
    seed: u64,
    #[arg(long, default_value_t = DEFAULT_QUESTION_COUNT)]
    count: usize,
  },
}

#[derive(clap::Args)]
struct OutputArgs {
  /// Print the full result as JSON
  #[arg(long)]
  json: bool,
  /// Also print a step-by-step explanation
  #[arg(long)]
  explain: bool,
}

fn main() -> anyhow::Result<()> {
  env_logger::init();
  let cli = Cli::parse();

  match cli.command {
    Commands::Eval { expression, x } => {
      match kalkumath::evaluate(&expression, x) {
        Ok(value) => println!("{value}"),
        Err(e) => eprintln!("{}", e.user_message()),
      }
    }
    Commands::Integral {
      expression,
      kind,
      lower,
      upper,
      axis,
      absolute,
      output,
    } => {
      let kind = match kind {
        KindArg::Indefinite => IntegralKind::Indefinite,
        KindArg::Definite => IntegralKind::Definite,
        KindArg::Area if absolute => IntegralKind::Area(AreaMethod::Absolute),
        KindArg::Area => IntegralKind::Area(AreaMethod::Net),
        KindArg::Volume => IntegralKind::Volume(match axis {
          AxisArg::X => Axis::X,
          AxisArg::Y => Axis::Y,
        }),
      };
      report(integral_calculator(kind, &expression, &lower, &upper), &output)?;
    }
    Commands::Limit {
      expression,
      approach,
      direction,
      output,
    } => {
      let direction = match direction {
        DirectionArg::Both => Direction::Both,
        DirectionArg::Left => Direction::Left,
        DirectionArg::Right => Direction::Right,
      };
      report(limit_calculator(&expression, &approach, direction), &output)?;
    }
    Commands::Derivative {
      expression,
      order,
      output,
    } => {
      report(derivative_calculator(&expression, order), &output)?;
    }
    Commands::Plot {
      expression,
      start,
      end,
      points,
      volume,
      output,
    } => {
      let options = SamplerOptions {
        start,
        end,
        point_count: points,
        mode: if volume {
          PlotMode::Volume
        } else {
          PlotMode::Normal
        },
      };
      let series = sample_function(&expression, &options);
      match output {
        Some(path) => match render_graph(&series, &GraphOptions::default()) {
          GraphView::Chart(svg) => {
            std::fs::write(&path, svg)
              .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {} points to {}", series.len(), path.display());
          }
          GraphView::Placeholder(message) => println!("{message}"),
        },
        None => {
          for point in &series.points {
            match point.negated_y {
              Some(negated) => println!("{}\t{}\t{}", point.x, point.y, negated),
              None => println!("{}\t{}", point.x, point.y),
            }
          }
        }
      }
    }
    Commands::Real { expression, output } => {
      report(real_calculator(&expression), &output)?;
    }
    Commands::Quiz { seed, count } => run_quiz(seed, count)?,
  }

  Ok(())
}

fn report(
  result: Result<ComputationResult, kalkumath::CalcError>,
  output: &OutputArgs,
) -> anyhow::Result<()> {
  let result = match result {
    Ok(result) => result,
    Err(e) => {
      eprintln!("{}", e.user_message());
      return Ok(());
    }
  };

  if output.json {
    println!("{}", serde_json::to_string_pretty(&result)?);
  } else {
    println!("{}", result.topic);
    println!("  {}", result.latex);
    println!("  = {}", result.display);
  }

  if output.explain {
    let runtime = tokio::runtime::Runtime::new()?;
    let view = runtime.block_on(async {
      let session = TutorSession::new(OfflineExplainer);
      let applied = session.submit(result).await?;
      log::debug!("explanation applied: {applied}");
      Ok::<_, tokio::task::JoinError>(session.view())
    })?;
    let explanation = match view.explanation {
      ExplanationState::Ready(explanation)
      | ExplanationState::Failed(explanation) => explanation,
      ExplanationState::Idle | ExplanationState::Pending => return Ok(()),
    };
    if !explanation.intro.is_empty() {
      println!("\n{}", explanation.intro);
    }
    for (i, step) in explanation.steps.iter().enumerate() {
      println!("{}. {step}", i + 1);
    }
  }
  Ok(())
}

fn run_quiz(seed: u64, count: usize) -> anyhow::Result<()> {
  let runtime = tokio::runtime::Runtime::new()?;
  let generator = LocalQuizGenerator::new(seed);
  let mut session = QuizSession::new(runtime.block_on(generator.generate(count)));

  let stdin = std::io::stdin();
  let mut lines = stdin.lock().lines();
  loop {
    match session.state().clone() {
      QuizState::Unavailable(reason) => {
        println!("Kuis tidak tersedia: {reason}");
        return Ok(());
      }
      QuizState::Completed => {
        let score = session.score();
        println!(
          "Kuis selesai! Skor: {}% ({} dari {})",
          score.percentage(),
          score.correct,
          score.total
        );
        return Ok(());
      }
      QuizState::InProgress { answered: true, .. } => session.advance(),
      QuizState::InProgress { index, .. } => {
        let Some(question) = session.current().cloned() else {
          return Ok(());
        };
        println!("\n[{}] {}", question.category, question.question);
        for (i, option) in question.options.iter().enumerate() {
          println!("  {}. {option}", i + 1);
        }
        print!("Jawaban ({}/{}): ", index + 1, session.questions().len());
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
          return Ok(());
        };
        let line = line?;
        let choice = line
          .trim()
          .parse::<usize>()
          .ok()
          .and_then(|n| question.options.get(n.wrapping_sub(1)))
          .cloned()
          .unwrap_or_else(|| line.trim().to_string());
        match session.answer(&choice) {
          Some(true) => println!("Benar!"),
          Some(false) => println!(
            "Salah. Jawaban: {}. {}",
            question.correct_answer, question.explanation
          ),
          None => {}
        }
      }
    }
  }
}
