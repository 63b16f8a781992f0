//! Admin resources: departments, designations, levels, shift policies,
//! salary structures and employees.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::anyhow;
use hrms_forms::{
    DepartmentDraft, DesignationDraft, EmployeeDraft, FileUpload, FormDraft, FormMode,
    LevelDraft, SalaryLineDraft, SalaryStructureDraft, SubmitOutcome,
};

use crate::cli::{
    DeleteArgs, DepartmentCreateArgs, DesignationCreateArgs, EmployeeRegisterArgs,
    LevelCreateArgs, OutputFormat, SalaryCreateArgs,
};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{
    render_departments, render_designations, render_employees, render_levels,
    render_salary_structures, render_shifts,
};

pub(crate) async fn handle_department_list(
    ctx: &AppContext,
    output: OutputFormat,
) -> CliResult<()> {
    ctx.require_session()?;
    let rows = ctx.client.departments().await?;
    render_departments(&rows, output)
}

pub(crate) async fn handle_department_create(
    ctx: &AppContext,
    args: DepartmentCreateArgs,
) -> CliResult<()> {
    create(ctx, &DepartmentDraft::new(args.name)).await
}

pub(crate) async fn handle_department_delete(ctx: &AppContext, args: DeleteArgs) -> CliResult<()> {
    ctx.require_session()?;
    if !args.yes {
        confirm(&format!("Delete department {}?", args.id))?;
    }
    ctx.submitter().delete::<DepartmentDraft>(args.id).await?;
    println!("Department {} deleted.", args.id);
    Ok(())
}

pub(crate) async fn handle_designation_list(
    ctx: &AppContext,
    output: OutputFormat,
) -> CliResult<()> {
    ctx.require_session()?;
    let rows = ctx.client.designations().await?;
    render_designations(&rows, output)
}

pub(crate) async fn handle_designation_create(
    ctx: &AppContext,
    args: DesignationCreateArgs,
) -> CliResult<()> {
    let draft = DesignationDraft {
        designation_name: args.name,
        department: args.department,
        level: args.level,
    };
    create(ctx, &draft).await
}

pub(crate) async fn handle_level_list(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    ctx.require_session()?;
    let rows = ctx.client.levels().await?;
    render_levels(&rows, output)
}

pub(crate) async fn handle_level_create(ctx: &AppContext, args: LevelCreateArgs) -> CliResult<()> {
    let draft = LevelDraft {
        level_name: args.name,
        description: args.description,
    };
    create(ctx, &draft).await
}

pub(crate) async fn handle_shift_list(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    ctx.require_session()?;
    let rows = ctx.client.shift_policies().await?;
    render_shifts(&rows, output)
}

pub(crate) async fn handle_salary_list(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    ctx.require_session()?;
    let rows = ctx.client.salary_structures().await?;
    render_salary_structures(&rows, output)
}

pub(crate) async fn handle_salary_create(
    ctx: &AppContext,
    args: SalaryCreateArgs,
) -> CliResult<()> {
    create(ctx, &salary_draft(args)).await
}

pub(crate) async fn handle_employee_list(
    ctx: &AppContext,
    output: OutputFormat,
) -> CliResult<()> {
    ctx.require_session()?;
    let rows = ctx.client.employees().await?;
    render_employees(&rows, output)
}

pub(crate) async fn handle_employee_register(
    ctx: &AppContext,
    args: EmployeeRegisterArgs,
) -> CliResult<()> {
    create(ctx, &employee_draft(args)?).await
}

async fn create<D: FormDraft>(ctx: &AppContext, draft: &D) -> CliResult<()> {
    ctx.require_session()?;
    let outcome = ctx.submitter().submit(draft, FormMode::Create).await?;
    report(&outcome);
    Ok(())
}

fn report(outcome: &SubmitOutcome) {
    println!("{}", outcome.message);
    if let Some(id) = outcome.response.get("id") {
        println!("id: {id}");
    }
}

fn salary_draft(args: SalaryCreateArgs) -> SalaryStructureDraft {
    let lines = |pairs: Vec<(String, String)>| {
        pairs
            .into_iter()
            .map(|(name, amount)| SalaryLineDraft::new(name, amount))
            .collect()
    };
    SalaryStructureDraft {
        name: args.name,
        basic_percent: args.basic,
        hra_percent: args.hra,
        conveyance_percent: args.conveyance,
        medical_percent: args.medical,
        special_percent: args.special,
        service_charge_percent: args.service_charge,
        total_working_days: args.working_days,
        allowances: lines(args.allowance),
        deductions: lines(args.deduction),
    }
}

fn employee_draft(args: EmployeeRegisterArgs) -> CliResult<EmployeeDraft> {
    let photo = match args.photo {
        Some(path) => Some(FileUpload::from_path(&path).map_err(|err| {
            CliError::validation(format!("cannot read photo '{}': {err}", path.display()))
        })?),
        None => None,
    };
    Ok(EmployeeDraft {
        first_name: args.first_name,
        middle_name: args.middle_name.unwrap_or_default(),
        last_name: args.last_name,
        email: args.email,
        mobile: args.mobile,
        gender: args.gender.unwrap_or_default(),
        date_of_birth: args.date_of_birth.unwrap_or_default(),
        date_of_joining: args.date_of_joining,
        date_of_releaving: args.date_of_releaving.unwrap_or_default(),
        department: args.department.unwrap_or_default(),
        designation: args.designation.unwrap_or_default(),
        level: args.level.unwrap_or_default(),
        reporting_manager: args.reporting_manager.unwrap_or_default(),
        source_of_employment: args.source.unwrap_or_default(),
        who_referred: args.referred_by.unwrap_or_default(),
        extra: args.field.into_iter().collect(),
        asset_details: args.asset,
        photo,
    })
}

fn confirm(question: &str) -> CliResult<()> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Err(CliError::validation(
            "refusing to delete without --yes when stdin is not a terminal",
        ));
    }
    print!("{question} [y/N] ");
    io::stdout()
        .flush()
        .map_err(|err| CliError::failure(anyhow!("failed to write prompt: {err}")))?;
    let mut answer = String::new();
    stdin
        .lock()
        .read_line(&mut answer)
        .map_err(|err| CliError::failure(anyhow!("failed to read confirmation: {err}")))?;
    if matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
        Ok(())
    } else {
        Err(CliError::validation("aborted"))
    }
}
