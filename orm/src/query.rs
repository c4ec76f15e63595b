//! Query of persistent objects
//!
//! The criterion is decoded by the dialect of the handler, the rows are
//! read by the session that created the query.

use log::debug;
use ujorm_core::utils::StringUtils;
use ujorm_core::{Criterion, SortKey, Value};

use crate::decoder::CriterionDecoder;
use crate::error::{OrmError, Result};
use crate::meta::OrmUjo;
use crate::session::{select_list, Session};

/// Query of the domain type `U`
#[derive(Debug)]
pub struct Query<'s, U> {
    session: &'s Session,
    criterion: Criterion<U>,
    order: Vec<SortKey>,
    limit: Option<u64>,
    offset: Option<u64>,
    distinct: bool,
}

/// Printed statement parts
struct Statement {
    from: String,
    where_sql: String,
    order: String,
    params: Vec<Value>,
}

impl<'s, U: OrmUjo> Query<'s, U> {
    pub(crate) fn new(session: &'s Session, criterion: Criterion<U>) -> Self {
        Query {
            session,
            criterion,
            order: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
        }
    }

    /// Append sort keys, nulls are sorted last
    pub fn order_by(mut self, keys: impl IntoIterator<Item = SortKey>) -> Self {
        self.order.extend(keys);
        self
    }

    /// Maximal count of rows
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Count of rows to skip
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Skip duplicate rows
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Criterion of the query
    pub fn criterion(&self) -> &Criterion<U> {
        &self.criterion
    }

    /// Printed `SELECT` statement
    pub fn sql(&self) -> Result<String> {
        Ok(self.select_sql(self.limit)?.0)
    }

    /// All matching objects
    pub fn list(&self) -> Result<Vec<U>> {
        let (sql, params) = self.select_sql(self.limit)?;
        self.session.select::<U>(&sql, &params)
    }

    /// The only matching object, more rows are an error
    pub fn unique_result(&self) -> Result<Option<U>> {
        let limit = Some(self.limit.map_or(2, |limit| limit.min(2)));
        let (sql, params) = self.select_sql(limit)?;
        let mut rows = self.session.select::<U>(&sql, &params)?;
        if rows.len() > 1 {
            return Err(OrmError::NonUnique(format!(
                "More than one row matches {}",
                StringUtils::truncate(&self.criterion.to_string(), 200)
            )));
        }
        Ok(rows.pop())
    }

    /// Count of the matching rows
    pub fn count(&self) -> Result<i64> {
        if self.distinct || self.limit.is_some() || self.offset.is_some() {
            let (inner, params) = self.select_sql(self.limit)?;
            let sql = format!("SELECT COUNT(*) FROM ({})", inner);
            return self.session.select_count(&sql, &params);
        }
        let statement = self.statement(false)?;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {}", statement.from, statement.where_sql);
        self.session.select_count(&sql, &statement.params)
    }

    /// Is there a matching row
    pub fn exists(&self) -> Result<bool> {
        let statement = self.statement(false)?;
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {})",
            statement.from, statement.where_sql
        );
        Ok(self.session.select_count(&sql, &statement.params)? != 0)
    }

    fn statement(&self, ordered: bool) -> Result<Statement> {
        let handler = self.session.handler();
        let table = handler.table_of::<U>()?.clone();
        let mut decoder = CriterionDecoder::new(handler.model(), handler.dialect(), table);
        let mut where_sql = decoder.decode(self.criterion.node())?;
        let order = if ordered {
            decoder.order_by(&self.order)?
        } else {
            String::new()
        };
        where_sql.push_str(&decoder.join_predicates());
        let from = decoder.from_tables().join(", ");

        Ok(Statement {
            from,
            where_sql,
            order,
            params: decoder.into_params(),
        })
    }

    fn select_sql(&self, limit: Option<u64>) -> Result<(String, Vec<Value>)> {
        let handler = self.session.handler();
        let table = handler.table_of::<U>()?;
        let statement = self.statement(true)?;

        let mut sql = format!(
            "SELECT {}{} FROM {} WHERE {}",
            if self.distinct { "DISTINCT " } else { "" },
            select_list(table),
            statement.from,
            statement.where_sql
        );
        if !statement.order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&statement.order);
        }
        handler.dialect().print_limit(&mut sql, limit, self.offset);
        debug!("Query of {}: {}", table.name, sql);
        Ok((sql, statement.params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrmConfig;
    use crate::handler::OrmHandler;
    use crate::test_domain::{City, Person};
    use proptest::prelude::*;
    use rstest::rstest;
    use ujorm_core::CriterionProvider;

    fn handler() -> OrmHandler {
        let _ = env_logger::builder().is_test(true).try_init();
        OrmHandler::builder(OrmConfig::testing())
            .register(City::table_model())
            .register(Person::table_model())
            .build()
            .unwrap()
    }

    /// Stored people, the first two live in Prague and the third in Brno
    fn populate(session: &mut Session) -> Vec<Person> {
        let keys = Person::keys();
        let mut prague = City::of("Prague");
        let mut brno = City::of("Brno");
        session.insert(&mut prague).unwrap();
        session.insert(&mut brno).unwrap();

        let mut people = vec![
            Person::of("Pavel", 10.0, "P1"),
            Person::of("Petr", 20.0, "p_2"),
            Person::of("Jan", 30.0, "J%3"),
            Person::of("jana", 20.0, "j4"),
            Person::new_instance(),
            Person::of("Čech", 40.0, "C6"),
        ];
        let cities = [&prague, &prague, &brno];
        for (person, city) in people.iter_mut().zip(cities) {
            let id = City::keys().id.of(city).unwrap();
            keys.city.set_reference(person, id).unwrap();
        }
        session.insert_all(&mut people).unwrap();
        session.commit().unwrap();
        people
    }

    fn names(people: &[Person]) -> Vec<String> {
        let name = &Person::keys().name;
        people.iter().map(|p| name.of(p).unwrap_or_default()).collect()
    }

    #[test]
    fn test_order_limit_offset() -> anyhow::Result<()> {
        let handler = handler();
        let mut session = handler.session()?;
        populate(&mut session);
        let keys = Person::keys();

        let query = session
            .create_query(keys.cash.for_ge(10.0))
            .order_by([keys.cash.descending(), keys.name.ascending()]);
        assert_eq!(names(&query.list()?), vec!["Čech", "Jan", "Petr", "jana", "Pavel"]);

        let page = session
            .create_query(keys.cash.for_ge(10.0))
            .order_by([keys.name.ascending()])
            .offset(1)
            .limit(2);
        assert_eq!(names(&page.list()?), vec!["Pavel", "Petr"]);
        assert_eq!(page.count()?, 2);
        assert!(page.sql()?.ends_with("LIMIT 2 OFFSET 1"));
        Ok(())
    }

    #[test]
    fn test_null_values_are_sorted_last() -> anyhow::Result<()> {
        let handler = handler();
        let mut session = handler.session()?;
        populate(&mut session);
        let keys = Person::keys();

        let list = session
            .create_query(Criterion::<Person>::constant(true))
            .order_by([keys.name.descending()])
            .list()?;
        assert_eq!(names(&list), vec!["Čech", "jana", "Petr", "Pavel", "Jan", ""]);
        Ok(())
    }

    #[test]
    fn test_unique_result() -> anyhow::Result<()> {
        let handler = handler();
        let mut session = handler.session()?;
        populate(&mut session);
        let keys = Person::keys();

        let jan = session.create_query(keys.code.for_eq("J%3".to_string())).unique_result()?;
        assert_eq!(keys.name.of(&jan.unwrap()), Some("Jan".to_string()));

        let none = session.create_query(keys.cash.for_gt(100.0)).unique_result()?;
        assert!(none.is_none());

        let many = session.create_query(keys.cash.for_eq(20.0)).unique_result();
        assert!(matches!(many, Err(OrmError::NonUnique(_))));
        Ok(())
    }

    #[test]
    fn test_count_and_exists_through_relation() -> anyhow::Result<()> {
        let handler = handler();
        let mut session = handler.session()?;
        populate(&mut session);
        let keys = Person::keys();
        let city_name = keys.city.add(&City::keys().name);

        let query = session.create_query(city_name.for_eq("Prague".to_string()));
        assert_eq!(query.count()?, 2);
        assert!(query.exists()?);
        assert!(query.sql()?.contains("FROM person, city WHERE"));

        let query = session.create_query(city_name.for_eq("Ostrava".to_string()));
        assert_eq!(query.count()?, 0);
        assert!(!query.exists()?);

        let distinct = session
            .create_query(keys.cash.for_eq(20.0))
            .distinct();
        assert_eq!(distinct.count()?, 2);
        Ok(())
    }

    #[rstest]
    #[case::starts(Person::keys().code.for_starts("p"), vec!["Petr"])]
    #[case::starts_ci(Person::keys().code.for_starts_ci("p"), vec!["Pavel", "Petr"])]
    #[case::contains_wildcard(Person::keys().code.for_contains("%"), vec!["Jan"])]
    #[case::contains_underscore(Person::keys().code.for_contains("_"), vec!["Petr"])]
    #[case::equals_ci(Person::keys().name.for_equals_ci("JANA"), vec!["jana"])]
    #[case::null(Person::keys().name.for_null(), vec![""])]
    #[case::neq(Person::keys().name.for_neq("Pavel".to_string()), vec!["Petr", "Jan", "jana", "", "Čech"])]
    #[case::not_in(Person::keys().cash.for_not_in(vec![10.0, 20.0]), vec!["Jan", "", "Čech"])]
    #[case::equals_ci_unicode(Person::keys().name.for_equals_ci("ČECH"), vec!["Čech"])]
    #[case::starts_ci_unicode(Person::keys().name.for_starts_ci("č"), vec!["Čech"])]
    #[case::regexp(Person::keys().name.for_regexp("J.*").unwrap(), vec!["Jan"])]
    #[case::not(Person::keys().cash.for_gt(15.0).not(), vec!["Pavel", ""])]
    fn test_sql_matches_memory(#[case] criterion: Criterion<Person>, #[case] expected: Vec<&str>) {
        let handler = handler();
        let mut session = handler.session().unwrap();
        let people = populate(&mut session);

        let order = [Person::keys().id.ascending()];
        let stored = session
            .create_query(criterion.clone())
            .order_by(order.clone())
            .list()
            .unwrap();
        assert_eq!(names(&stored), expected);

        let all = session
            .create_query(Criterion::<Person>::constant(true))
            .order_by(order)
            .list()
            .unwrap();
        let filtered: Vec<Person> = criterion.filter(&all).unwrap().into_iter().cloned().collect();
        assert_eq!(names(&filtered), expected);
        assert_eq!(all.len(), people.len());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn test_sql_parity_of_cash_ranges(low in 0.0f64..40.0, high in 0.0f64..40.0, negate in any::<bool>()) {
            let handler = handler();
            let mut session = handler.session().unwrap();
            populate(&mut session);
            let keys = Person::keys();

            let mut criterion = keys.cash.for_ge(low).and(&keys.cash.for_le(high));
            if negate {
                criterion = criterion.not();
            }
            let all = session.create_query(Criterion::<Person>::constant(true)).list().unwrap();
            let expected = criterion.filter(&all).unwrap().len() as i64;
            prop_assert_eq!(session.create_query(criterion).count().unwrap(), expected);
        }
    }
}
